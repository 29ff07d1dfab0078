//! Sources of granted permissions

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{group_scopes_by_action, GrantedPermissions, Permission};

/// Supplies the permissions a user holds within an organization
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn granted_permissions(&self, user_id: i64, org_id: i64) -> Result<GrantedPermissions>;
}

/// In-memory permission source
pub struct InMemoryPermissionSource {
    grants: Arc<RwLock<HashMap<(i64, i64), Vec<Permission>>>>,
}

impl InMemoryPermissionSource {
    pub fn new() -> Self {
        Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Grant a permission to a user within an org
    pub async fn grant(&self, user_id: i64, org_id: i64, permission: Permission) {
        let mut grants = self.grants.write().await;
        let permissions = grants.entry((user_id, org_id)).or_default();
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }

    /// Remove every grant held by a user within an org
    pub async fn revoke_all(&self, user_id: i64, org_id: i64) {
        self.grants.write().await.remove(&(user_id, org_id));
    }
}

impl Default for InMemoryPermissionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionSource for InMemoryPermissionSource {
    async fn granted_permissions(&self, user_id: i64, org_id: i64) -> Result<GrantedPermissions> {
        let grants = self.grants.read().await;
        Ok(grants
            .get(&(user_id, org_id))
            .map(|permissions| group_scopes_by_action(permissions))
            .unwrap_or_default())
    }
}
