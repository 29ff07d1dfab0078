/// Scope rewriting functions
///
/// A modifier maps one scope string to another. Modifiers are total: a scope
/// they have nothing to say about is returned unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::template::{self, TemplateData};
use crate::error::Result;

/// Synchronous, side-effect free scope rewrite
pub trait ScopeModifier: Send + Sync {
    fn modify(&self, scope: &str) -> Result<String>;
}

impl<F> ScopeModifier for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn modify(&self, scope: &str) -> Result<String> {
        self(scope)
    }
}

/// Scope rewrite that may perform I/O (attribute lookups)
#[async_trait]
pub trait AsyncScopeModifier: Send + Sync {
    async fn modify(&self, scope: &str) -> Result<String>;
}

/// Sequential composition: `second` is applied to the output of `first`
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: ScopeModifier, B: ScopeModifier> ScopeModifier for Chain<A, B> {
    fn modify(&self, scope: &str) -> Result<String> {
        let scope = ScopeModifier::modify(&self.first, scope)?;
        ScopeModifier::modify(&self.second, &scope)
    }
}

#[async_trait]
impl<A: AsyncScopeModifier, B: AsyncScopeModifier> AsyncScopeModifier for Chain<A, B> {
    async fn modify(&self, scope: &str) -> Result<String> {
        let scope = AsyncScopeModifier::modify(&self.first, scope).await?;
        AsyncScopeModifier::modify(&self.second, &scope).await
    }
}

/// Leaves every scope untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ScopeModifier for Identity {
    fn modify(&self, scope: &str) -> Result<String> {
        Ok(scope.to_string())
    }
}

#[async_trait]
impl AsyncScopeModifier for Identity {
    async fn modify(&self, scope: &str) -> Result<String> {
        Ok(scope.to_string())
    }
}

/// Request parameters injected into scope templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeParams {
    pub org_id: i64,
    #[serde(default)]
    pub url_params: HashMap<String, String>,
}

impl TemplateData for ScopeParams {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "OrgID" => Some(self.org_id.to_string()),
            _ => None,
        }
    }

    fn index(&self, name: &str, key: &str) -> Option<String> {
        match name {
            "URLParams" => self.url_params.get(key).cloned(),
            _ => None,
        }
    }
}

/// Expands `{{ .OrgID }}` and `{{ index .URLParams "key" }}` placeholders
#[derive(Debug, Clone)]
pub struct ScopeInjector {
    params: ScopeParams,
}

impl ScopeInjector {
    pub fn new(params: ScopeParams) -> Self {
        Self { params }
    }
}

impl ScopeModifier for ScopeInjector {
    fn modify(&self, scope: &str) -> Result<String> {
        Ok(template::expand(scope, &self.params)?)
    }
}

#[async_trait]
impl AsyncScopeModifier for ScopeInjector {
    async fn modify(&self, scope: &str) -> Result<String> {
        ScopeModifier::modify(self, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessControlError;
    use crate::scope::{field, parameter, scope};

    fn params() -> ScopeParams {
        ScopeParams {
            org_id: 7,
            url_params: HashMap::from([(":id".to_string(), "12".to_string())]),
        }
    }

    #[test]
    fn test_scope_injector() {
        let injector = ScopeInjector::new(params());

        let injected = ScopeModifier::modify(&injector, &scope(&["orgs", "id", &field("OrgID")])).unwrap();
        assert_eq!(injected, "orgs:id:7");

        let injected = ScopeModifier::modify(&injector, &scope(&["dashboards", "id", &parameter(":id")])).unwrap();
        assert_eq!(injected, "dashboards:id:12");

        let untouched = ScopeModifier::modify(&injector, "dashboards:*").unwrap();
        assert_eq!(untouched, "dashboards:*");
    }

    #[test]
    fn test_scope_injector_syntax_error() {
        let injector = ScopeInjector::new(params());
        let err = ScopeModifier::modify(&injector, "orgs:id:{{ .OrgID").unwrap_err();
        assert!(matches!(err, AccessControlError::Template(_)));
    }

    #[test]
    fn test_closure_modifier_and_chain() {
        let upper = |scope: &str| -> Result<String> { Ok(scope.to_uppercase()) };
        let suffix = |scope: &str| -> Result<String> { Ok(format!("{}:x", scope)) };

        let chained = Chain::new(upper, suffix);
        assert_eq!(ScopeModifier::modify(&chained, "a:b").unwrap(), "A:B:x");
    }

    #[tokio::test]
    async fn test_async_chain() {
        let chained = Chain::new(ScopeInjector::new(params()), Identity);
        let scope = AsyncScopeModifier::modify(&chained, "orgs:id:{{ .OrgID }}").await.unwrap();
        assert_eq!(scope, "orgs:id:7");
    }
}
