/// Keyword scope resolution
///
/// Rewrites subject-relative keywords into identifier scopes for the requesting
/// user. The vocabulary is closed:
///
/// | keyword        | resolves to              |
/// |----------------|--------------------------|
/// | `users:self`   | `users:id:<user id>`     |
/// | `orgs:current` | `orgs:id:<org id>`       |
///
/// Keyword templates are expanded against the user. Any other scope is returned
/// unchanged, placeholders and braces included.

use async_trait::async_trait;

use super::modifier::{AsyncScopeModifier, ScopeModifier};
use super::template::{self, TemplateData};
use crate::error::Result;
use crate::types::UserContext;

/// Supported keywords and their scope templates
pub const KEYWORDS: [(&str, &str); 2] = [
    ("users:self", "users:id:{{ .UserId }}"),
    ("orgs:current", "orgs:id:{{ .OrgId }}"),
];

/// Template for a keyword scope, if the scope is one
pub fn keyword_template(scope: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == scope)
        .map(|(_, template)| *template)
}

impl TemplateData for UserContext {
    fn field(&self, name: &str) -> Option<String> {
        self.template_field(name)
    }
}

/// Modifier bound to one user
#[derive(Debug, Clone, Copy)]
pub struct KeywordScopeModifier<'a> {
    user: &'a UserContext,
}

impl<'a> KeywordScopeModifier<'a> {
    pub fn new(user: &'a UserContext) -> Self {
        Self { user }
    }
}

impl ScopeModifier for KeywordScopeModifier<'_> {
    fn modify(&self, scope: &str) -> Result<String> {
        match keyword_template(scope) {
            Some(source) => Ok(template::expand(source, self.user)?),
            None => Ok(scope.to_string()),
        }
    }
}

#[async_trait]
impl<'a> AsyncScopeModifier for KeywordScopeModifier<'a> {
    async fn modify(&self, scope: &str) -> Result<String> {
        ScopeModifier::modify(self, scope)
    }
}
