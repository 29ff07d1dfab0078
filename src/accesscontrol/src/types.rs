//! Core access control types

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Scopes held by a subject, grouped by action
pub type GrantedPermissions = HashMap<String, HashSet<String>>;

/// Atomic unit of a grant or a requirement
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Action name (e.g., "datasources:read")
    pub action: String,

    /// Colon-delimited scope (e.g., "datasources:id:1"), empty for action-only grants
    #[serde(default)]
    pub scope: String,
}

impl Permission {
    /// Create a permission with a scope
    pub fn new(action: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: scope.into(),
        }
    }

    /// Create an action-only permission
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: String::new(),
        }
    }
}

/// Group permissions by action
///
/// Actions granted without a scope still get an (empty) entry so that
/// action-only requirements are satisfied.
pub fn group_scopes_by_action(permissions: &[Permission]) -> GrantedPermissions {
    let mut grouped = GrantedPermissions::new();
    for permission in permissions {
        let scopes = grouped.entry(permission.action.clone()).or_default();
        if !permission.scope.is_empty() {
            scopes.insert(permission.scope.clone());
        }
    }
    grouped
}

/// Organization role of the requesting user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgRole {
    #[default]
    Viewer,
    Editor,
    Admin,
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewer => write!(f, "Viewer"),
            Self::Editor => write!(f, "Editor"),
            Self::Admin => write!(f, "Admin"),
        }
    }
}

/// Subject performing an access check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: i64,
    pub org_id: i64,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub org_role: OrgRole,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl UserContext {
    /// Create a user context for a user within an organization
    pub fn new(user_id: i64, org_id: i64) -> Self {
        Self {
            user_id,
            org_id,
            ..Default::default()
        }
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = login.into();
        self
    }

    pub fn with_org_role(mut self, role: OrgRole) -> Self {
        self.org_role = role;
        self
    }

    /// Value of a template field (`{{ .UserId }}` and friends)
    pub(crate) fn template_field(&self, name: &str) -> Option<String> {
        match name {
            "UserId" => Some(self.user_id.to_string()),
            "OrgId" => Some(self.org_id.to_string()),
            "OrgName" => Some(self.org_name.clone()),
            "OrgRole" => Some(self.org_role.to_string()),
            "Login" => Some(self.login.clone()),
            "Name" => Some(self.name.clone()),
            "Email" => Some(self.email.clone()),
            _ => None,
        }
    }
}
