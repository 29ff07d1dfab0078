/// Attribute scope resolution
///
/// Translates human-readable attribute scopes (`datasources:name:testds`) into
/// identifier scopes (`datasources:id:1`) through externally supplied lookups.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::builder::{scope, scope_prefix, SEPARATOR};
use super::modifier::AsyncScopeModifier;
use crate::error::{AccessControlError, Result};

/// Cancellation and deadline for a resolution pass
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    cancel: CancellationToken,
    deadline: Option<Deadline>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl ResolveContext {
    /// Context without deadline, cancellable through its token
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a deadline `timeout` from now, shared by every lookup made under
    /// this context and its clones
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Deadline {
            at: Instant::now() + timeout,
            timeout,
        });
        self
    }

    /// Ties the context to an externally owned token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.deadline.map(|d| d.timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|d| d.at)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes once the context is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// External lookup translating an attribute value into an identifier
#[async_trait]
pub trait AttributeResolver: Send + Sync {
    /// Scope prefix handled by this resolver, e.g. `"datasources:name:"`
    fn prefix(&self) -> &str;

    /// Attribute type written into the rewritten scope
    fn resolved_attribute(&self) -> &str {
        "id"
    }

    /// Looks up the identifier for `value` within `org_id`
    async fn resolve(&self, ctx: &ResolveContext, org_id: i64, value: &str) -> Result<String>;
}

/// Adapts an async closure into an [`AttributeResolver`]
pub struct FnAttributeResolver<F> {
    prefix: String,
    resolve: F,
}

impl<F, Fut> FnAttributeResolver<F>
where
    F: Fn(ResolveContext, i64, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    pub fn new(prefix: impl Into<String>, resolve: F) -> Self {
        Self {
            prefix: prefix.into(),
            resolve,
        }
    }
}

#[async_trait]
impl<F, Fut> AttributeResolver for FnAttributeResolver<F>
where
    F: Fn(ResolveContext, i64, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn resolve(&self, ctx: &ResolveContext, org_id: i64, value: &str) -> Result<String> {
        (self.resolve)(ctx.clone(), org_id, value.to_string()).await
    }
}

/// Modifier resolving attribute scopes for one organization
///
/// Scopes whose prefix has no registered resolver pass through unchanged.
pub struct AttributeScopeModifier<'a> {
    resolvers: &'a HashMap<String, Arc<dyn AttributeResolver>>,
    ctx: ResolveContext,
    org_id: i64,
}

impl<'a> AttributeScopeModifier<'a> {
    pub(crate) fn new(
        resolvers: &'a HashMap<String, Arc<dyn AttributeResolver>>,
        ctx: ResolveContext,
        org_id: i64,
    ) -> Self {
        Self {
            resolvers,
            ctx,
            org_id,
        }
    }

    async fn lookup(&self, resolver: &dyn AttributeResolver, scope: &str, value: &str) -> Result<String> {
        let lookup = resolver.resolve(&self.ctx, self.org_id, value);
        let bounded = async {
            match self.ctx.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline.at, lookup).await {
                    Ok(result) => result,
                    Err(_) => Err(AccessControlError::Timeout {
                        scope: scope.to_string(),
                        timeout: deadline.timeout,
                    }),
                },
                None => lookup.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => Err(AccessControlError::Cancelled(scope.to_string())),
            result = bounded => result,
        }
    }
}

#[async_trait]
impl<'a> AsyncScopeModifier for AttributeScopeModifier<'a> {
    async fn modify(&self, original: &str) -> Result<String> {
        let prefix = scope_prefix(original);
        let Some(resolver) = self.resolvers.get(prefix) else {
            return Ok(original.to_string());
        };

        let value = &original[prefix.len()..];
        let identifier = self.lookup(resolver.as_ref(), original, value).await?;

        let kind = prefix.split(SEPARATOR).next().unwrap_or_default();
        let resolved = scope(&[kind, resolver.resolved_attribute(), &identifier]);
        debug!(scope = original, resolved = %resolved, org_id = self.org_id, "resolved attribute scope");

        Ok(resolved)
    }
}
