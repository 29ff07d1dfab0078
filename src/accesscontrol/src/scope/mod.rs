//! Scope matching and resolution
//!
//! Scopes are colon-delimited strings (`datasources:id:1`) optionally ending in
//! a wildcard (`datasources:*`). This module matches granted scopes against
//! required ones and rewrites required scopes before evaluation:
//!
//! - keyword resolution (`users:self` → `users:id:2`)
//! - attribute resolution (`datasources:name:testds` → `datasources:id:1`)
//! - parameter injection (`{{ .OrgID }}`, `{{ index .URLParams ":id" }}`)
//!
//! # Examples
//!
//! ```
//! use cretoai_accesscontrol::scope::{match_scope, scope, scope_prefix};
//!
//! assert!(match_scope("datasources:*", "datasources:id:1").unwrap());
//! assert_eq!(scope_prefix(&scope(&["datasources", "name", "testds"])), "datasources:name:");
//! ```

mod attribute;
mod builder;
mod keyword;
mod matcher;
mod modifier;
mod resolver;
mod template;

#[cfg(test)]
mod tests;

pub use attribute::{AttributeResolver, AttributeScopeModifier, FnAttributeResolver, ResolveContext};
pub use builder::{field, parameter, scope, scope_prefix, SEPARATOR};
pub use keyword::{keyword_template, KeywordScopeModifier, KEYWORDS};
pub use matcher::{match_scope, validate_scope, WILDCARD};
pub use modifier::{AsyncScopeModifier, Chain, Identity, ScopeInjector, ScopeModifier, ScopeParams};
pub use resolver::ScopeResolver;
pub use template::{expand, TemplateData, TemplateError};
