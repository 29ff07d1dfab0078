/// Scope resolver registry
///
/// Holds the attribute resolvers registered at service start and hands out
/// modifiers bound to a request. The registry is only mutated while it is being
/// built; afterwards it is shared read-only (typically behind an `Arc`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::attribute::{AttributeResolver, AttributeScopeModifier, ResolveContext};

/// Registry of attribute resolvers keyed by scope prefix
///
/// # Examples
///
/// ```
/// use cretoai_accesscontrol::scope::{FnAttributeResolver, ScopeResolver};
/// use cretoai_accesscontrol::AccessControlError;
///
/// let mut resolver = ScopeResolver::new();
/// resolver.add_attribute_resolver(FnAttributeResolver::new(
///     "teams:name:",
///     |_ctx, _org_id, name: String| async move { Ok::<_, AccessControlError>(format!("{}-id", name)) },
/// ));
///
/// assert!(resolver.has_attribute_resolver("teams:name:"));
/// ```
#[derive(Default, Clone)]
pub struct ScopeResolver {
    /// Attribute resolvers keyed by exact scope prefix
    attribute_resolvers: HashMap<String, Arc<dyn AttributeResolver>>,
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an attribute resolver under its prefix
    ///
    /// A second resolver for the same prefix replaces the first.
    pub fn add_attribute_resolver<R>(&mut self, resolver: R)
    where
        R: AttributeResolver + 'static,
    {
        self.add_shared_attribute_resolver(Arc::new(resolver));
    }

    /// Registers an already shared attribute resolver
    pub fn add_shared_attribute_resolver(&mut self, resolver: Arc<dyn AttributeResolver>) {
        let prefix = resolver.prefix().to_string();
        if self.attribute_resolvers.insert(prefix.clone(), resolver).is_some() {
            warn!(prefix = %prefix, "replaced attribute resolver");
        } else {
            info!(prefix = %prefix, "registered attribute resolver");
        }
    }

    /// Builder-style registration
    pub fn with_attribute_resolver<R>(mut self, resolver: R) -> Self
    where
        R: AttributeResolver + 'static,
    {
        self.add_attribute_resolver(resolver);
        self
    }

    pub fn has_attribute_resolver(&self, prefix: &str) -> bool {
        self.attribute_resolvers.contains_key(prefix)
    }

    /// Registered prefixes, sorted
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.attribute_resolvers.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }

    /// Modifier resolving attribute scopes within `org_id`
    pub fn attribute_modifier(&self, ctx: ResolveContext, org_id: i64) -> AttributeScopeModifier<'_> {
        AttributeScopeModifier::new(&self.attribute_resolvers, ctx, org_id)
    }
}

impl fmt::Debug for ScopeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeResolver")
            .field("attribute_resolvers", &self.prefixes())
            .finish()
    }
}
