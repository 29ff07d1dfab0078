//! Permission requirement evaluators
//!
//! A requirement is a small boolean tree over `(action, scopes)` leaves. Trees
//! are built once by policy code and never mutated: rewriting scopes always
//! yields a new tree, so the original stays usable as a template for other
//! users and requests.
//!
//! # Example
//!
//! ```rust
//! use cretoai_accesscontrol::evaluator::{eval_all, eval_any, eval_permission};
//! use cretoai_accesscontrol::scope::scope;
//! use cretoai_accesscontrol::GrantedPermissions;
//!
//! let requirement = eval_all(vec![
//!     eval_permission("datasources:read", [scope(&["datasources", "id", "1"])]),
//!     eval_any(vec![
//!         eval_permission("datasources:query", ["datasources:id:1"]),
//!         eval_permission("datasources:explore", ["datasources:id:1"]),
//!     ]),
//! ]);
//!
//! let mut granted = GrantedPermissions::new();
//! granted.entry("datasources:read".into()).or_default().insert("datasources:*".into());
//! granted.entry("datasources:query".into()).or_default().insert("datasources:id:1".into());
//!
//! assert!(requirement.evaluate(&granted).unwrap());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::scope::{match_scope, AsyncScopeModifier, ScopeModifier};
use crate::types::GrantedPermissions;


/// Permission requirement tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluator {
    /// Requires `action` together with every listed scope
    ///
    /// `None` means no scope restriction is configured, `Some(vec![])` means a
    /// restriction is present but empty. Both are action-only checks.
    Permission {
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scopes: Option<Vec<String>>,
    },

    /// Requires every child
    All { all_of: Vec<Evaluator> },

    /// Requires at least one child
    Any { any_of: Vec<Evaluator> },
}

/// Requires `action` regardless of scope
pub fn eval_action(action: impl Into<String>) -> Evaluator {
    Evaluator::Permission {
        action: action.into(),
        scopes: None,
    }
}

/// Requires `action` in combination with all of `scopes`
pub fn eval_permission<I, S>(action: impl Into<String>, scopes: I) -> Evaluator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Evaluator::Permission {
        action: action.into(),
        scopes: Some(scopes.into_iter().map(Into::into).collect()),
    }
}

/// Requires all of the passed evaluators
pub fn eval_all(all_of: Vec<Evaluator>) -> Evaluator {
    Evaluator::All { all_of }
}

/// Requires at least one of the passed evaluators
pub fn eval_any(any_of: Vec<Evaluator>) -> Evaluator {
    Evaluator::Any { any_of }
}

impl Evaluator {
    /// Evaluates the requirement against permissions grouped by action
    ///
    /// `All` stops at the first child that is false or fails, `Any` at the
    /// first child that is true or fails.
    pub fn evaluate(&self, granted: &GrantedPermissions) -> Result<bool> {
        match self {
            Self::Permission { action, scopes } => {
                let Some(user_scopes) = granted.get(action) else {
                    return Ok(false);
                };

                let required = match scopes {
                    Some(scopes) if !scopes.is_empty() => scopes,
                    _ => return Ok(true),
                };

                for target in required {
                    let mut matches = false;
                    for scope in user_scopes {
                        if match_scope(scope, target)? {
                            matches = true;
                            break;
                        }
                    }
                    if !matches {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            Self::All { all_of } => {
                for evaluator in all_of {
                    if !evaluator.evaluate(granted)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any { any_of } => {
                for evaluator in any_of {
                    if evaluator.evaluate(granted)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Returns a new tree with every leaf scope passed through `modifier`
    ///
    /// The first modifier error aborts the rewrite.
    pub fn modify_scopes<M>(&self, modifier: &M) -> Result<Evaluator>
    where
        M: ScopeModifier + ?Sized,
    {
        match self {
            Self::Permission { action, scopes } => {
                let Some(scopes) = scopes else {
                    return Ok(eval_action(action.clone()));
                };

                let mut resolved = Vec::with_capacity(scopes.len());
                for scope in scopes {
                    resolved.push(ScopeModifier::modify(modifier, scope)?);
                }
                Ok(eval_permission(action.clone(), resolved))
            }
            Self::All { all_of } => Ok(eval_all(Self::modify_children(all_of, modifier)?)),
            Self::Any { any_of } => Ok(eval_any(Self::modify_children(any_of, modifier)?)),
        }
    }

    fn modify_children<M>(children: &[Evaluator], modifier: &M) -> Result<Vec<Evaluator>>
    where
        M: ScopeModifier + ?Sized,
    {
        children.iter().map(|child| child.modify_scopes(modifier)).collect()
    }

    /// Async counterpart of [`Evaluator::modify_scopes`] for modifiers doing I/O
    ///
    /// Each distinct scope is resolved once, in tree order; the first error
    /// aborts resolution. The rewritten tree has the same shape as `self`.
    pub async fn resolve_scopes<M>(&self, modifier: &M) -> Result<Evaluator>
    where
        M: AsyncScopeModifier + ?Sized,
    {
        let mut resolved: HashMap<&str, String> = HashMap::new();
        for scope in self.scopes() {
            if resolved.contains_key(scope) {
                continue;
            }
            let rewritten = AsyncScopeModifier::modify(modifier, scope).await?;
            resolved.insert(scope, rewritten);
        }

        let lookup = |scope: &str| -> Result<String> {
            Ok(resolved
                .get(scope)
                .cloned()
                .unwrap_or_else(|| scope.to_string()))
        };
        self.modify_scopes(&lookup)
    }

    /// Every leaf scope, in tree order
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes = Vec::new();
        self.collect_scopes(&mut scopes);
        scopes
    }

    fn collect_scopes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Permission { scopes, .. } => {
                out.extend(scopes.iter().flatten().map(String::as_str));
            }
            Self::All { all_of: children } | Self::Any { any_of: children } => {
                for child in children {
                    child.collect_scopes(out);
                }
            }
        }
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission { action, scopes } => {
                let scopes = scopes.as_deref().unwrap_or_default().join(", ");
                write!(f, "action:{} scopes:{}", action, scopes)
            }
            Self::All { all_of } => write!(f, "all({})", join_children(all_of)),
            Self::Any { any_of } => write!(f, "any({})", join_children(any_of)),
        }
    }
}

fn join_children(children: &[Evaluator]) -> String {
    children
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
