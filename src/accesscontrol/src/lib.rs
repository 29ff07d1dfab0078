//! # CretoAI Access Control
//!
//! Permission evaluation and scope resolution engine.
//!
//! ## Features
//!
//! - **Boolean requirements** over `(action, scope)` pairs (`all` / `any` trees)
//! - **Wildcard scopes** with fail-closed validation (`datasources:*`)
//! - **Keyword resolution** of user-relative scopes (`users:self`)
//! - **Attribute resolution** through pluggable, prefix-keyed async lookups
//!   (`datasources:name:testds` → `datasources:id:1`)
//! - **Non-destructive rewrites**: requirement trees are immutable templates
//!
//! ## Example
//!
//! ```rust
//! use cretoai_accesscontrol::{
//!     eval_all, eval_permission, AccessControl, AccessControlConfig, InMemoryPermissionSource,
//!     Permission, ResolveContext, ScopeResolver, UserContext,
//! };
//! use cretoai_accesscontrol::datasource::{
//!     AddDataSourceCommand, DatasourceNameScopeResolver, InMemoryDataSourceStore,
//! };
//! use cretoai_accesscontrol::scope::scope;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryDataSourceStore::new());
//!     store.add(AddDataSourceCommand {
//!         name: "testds".into(),
//!         org_id: 1,
//!         ..Default::default()
//!     }).await?;
//!
//!     let mut resolver = ScopeResolver::new();
//!     resolver.add_attribute_resolver(DatasourceNameScopeResolver::new(store));
//!
//!     let permissions = Arc::new(InMemoryPermissionSource::new());
//!     permissions.grant(2, 1, Permission::new("datasources:read", "datasources:id:1")).await;
//!     permissions.grant(2, 1, Permission::new("users:read", "users:id:2")).await;
//!
//!     let ac = AccessControl::new(AccessControlConfig::default(), Arc::new(resolver), permissions);
//!
//!     let requirement = eval_all(vec![
//!         eval_permission("datasources:read", [scope(&["datasources", "name", "testds"])]),
//!         eval_permission("users:read", ["users:self"]),
//!     ]);
//!
//!     let user = UserContext::new(2, 1);
//!     assert!(ac.evaluate(&ResolveContext::new(), &user, &requirement).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod datasource;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod permissions;
pub mod scope;
pub mod types;

// Re-export commonly used types
pub use engine::{AccessControl, AccessControlConfig, AccessDecision};
pub use error::{AccessControlError, Result};
pub use evaluator::{eval_action, eval_all, eval_any, eval_permission, Evaluator};
pub use permissions::{InMemoryPermissionSource, PermissionSource};
pub use scope::{
    AsyncScopeModifier, AttributeResolver, ResolveContext, ScopeModifier, ScopeResolver,
};
pub use types::{GrantedPermissions, OrgRole, Permission, UserContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
