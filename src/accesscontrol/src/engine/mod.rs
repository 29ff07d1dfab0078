//! Access control facade
//!
//! Ties the pieces together for a request: load the user's grants, rewrite the
//! requirement's scopes (keywords first, then attributes), evaluate.
//!
//! ```text
//! Evaluator ──► keyword modifier ──► attribute modifier ──► evaluate(granted)
//!                  (UserContext)      (ScopeResolver, I/O)      ▲
//!                                                              │
//!                                   PermissionSource ──────────┘
//! ```

pub mod config;
pub mod decision;
pub mod metrics;

pub use config::AccessControlConfig;
pub use decision::AccessDecision;
pub use metrics::{AccessControlMetrics, MetricsCollector};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::permissions::PermissionSource;
use crate::scope::{Chain, KeywordScopeModifier, ResolveContext, ScopeResolver};
use crate::types::UserContext;

/// Access control service
pub struct AccessControl {
    /// Keyword and attribute scope resolution
    resolver: Arc<ScopeResolver>,

    /// Source of granted permissions
    permissions: Arc<dyn PermissionSource>,

    /// Metrics collector
    metrics: Option<Arc<MetricsCollector>>,

    config: AccessControlConfig,
}

impl AccessControl {
    pub fn new(
        config: AccessControlConfig,
        resolver: Arc<ScopeResolver>,
        permissions: Arc<dyn PermissionSource>,
    ) -> Self {
        let metrics = if config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        info!(
            keywords = config.resolve_keywords,
            attributes = config.resolve_attributes,
            lookup_timeout_ms = config.lookup_timeout.as_millis() as u64,
            "AccessControl initialized"
        );

        Self {
            resolver,
            permissions,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &AccessControlConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Rewrite the requirement's scopes for `user`
    ///
    /// The configured lookup timeout applies when `ctx` carries none.
    pub async fn resolve(
        &self,
        ctx: &ResolveContext,
        user: &UserContext,
        evaluator: &Evaluator,
    ) -> Result<Evaluator> {
        let start = Instant::now();

        let ctx = match ctx.timeout() {
            Some(_) => ctx.clone(),
            None => ctx.clone().with_timeout(self.config.lookup_timeout),
        };
        let keywords = KeywordScopeModifier::new(user);
        let attributes = self.resolver.attribute_modifier(ctx, user.org_id);

        let resolved = match (self.config.resolve_keywords, self.config.resolve_attributes) {
            (true, true) => evaluator.resolve_scopes(&Chain::new(keywords, attributes)).await?,
            (true, false) => evaluator.modify_scopes(&keywords)?,
            (false, true) => evaluator.resolve_scopes(&attributes).await?,
            (false, false) => evaluator.clone(),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_resolution(start.elapsed()).await;
        }

        Ok(resolved)
    }

    /// Evaluate a requirement for `user`
    ///
    /// Any error means the requirement cannot be considered satisfied.
    pub async fn evaluate(
        &self,
        ctx: &ResolveContext,
        user: &UserContext,
        evaluator: &Evaluator,
    ) -> Result<bool> {
        let granted = self
            .permissions
            .granted_permissions(user.user_id, user.org_id)
            .await?;
        let resolved = self.resolve(ctx, user, evaluator).await?;

        debug!(
            user_id = user.user_id,
            org_id = user.org_id,
            requirement = %resolved,
            "evaluating requirement"
        );

        resolved.evaluate(&granted)
    }

    /// Evaluate a requirement, turning errors into a deny decision
    pub async fn check(
        &self,
        ctx: &ResolveContext,
        user: &UserContext,
        evaluator: &Evaluator,
    ) -> AccessDecision {
        let requirement = evaluator.to_string();

        match self.evaluate(ctx, user, evaluator).await {
            Ok(allowed) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_check(allowed).await;
                }

                debug!(user_id = user.user_id, allowed, requirement = %requirement, "access check");
                if allowed {
                    AccessDecision::allow(requirement)
                } else {
                    AccessDecision::deny(requirement, "missing required permission")
                }
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_error().await;
                }

                warn!(user_id = user.user_id, requirement = %requirement, error = %e, "access check failed, denying");
                AccessDecision::deny(requirement, e.to_string())
            }
        }
    }

    /// Get metrics, if enabled
    pub async fn get_metrics(&self) -> Option<AccessControlMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.get_metrics().await),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::eval_permission;
    use crate::permissions::InMemoryPermissionSource;
    use crate::types::Permission;

    #[tokio::test]
    async fn test_keyword_only_configuration() {
        let source = Arc::new(InMemoryPermissionSource::new());
        source.grant(2, 1, Permission::new("users:read", "users:id:2")).await;

        let config = AccessControlConfig {
            resolve_attributes: false,
            ..Default::default()
        };
        let ac = AccessControl::new(config, Arc::new(ScopeResolver::new()), source);

        let user = UserContext::new(2, 1);
        let requirement = eval_permission("users:read", ["users:self"]);

        assert!(ac.evaluate(&ResolveContext::new(), &user, &requirement).await.unwrap());
        assert!(!ac
            .evaluate(&ResolveContext::new(), &UserContext::new(3, 1), &requirement)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let config = AccessControlConfig {
            enable_metrics: false,
            ..Default::default()
        };
        let ac = AccessControl::new(
            config,
            Arc::new(ScopeResolver::new()),
            Arc::new(InMemoryPermissionSource::new()),
        );

        let decision = ac
            .check(&ResolveContext::new(), &UserContext::new(1, 1), &eval_permission("users:read", ["users:self"]))
            .await;
        assert!(!decision.allowed);
        assert!(ac.get_metrics().await.is_none());
    }
}
