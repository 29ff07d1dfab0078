//! Access decision records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Unique decision identifier
    pub id: String,

    /// Whether access is granted
    pub allowed: bool,

    /// Rendering of the evaluated requirement
    pub requirement: String,

    /// Reason for the decision
    pub reason: String,

    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}

impl AccessDecision {
    pub fn new(allowed: bool, requirement: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            allowed,
            requirement: requirement.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn allow(requirement: impl Into<String>) -> Self {
        Self::new(true, requirement, "requirement satisfied")
    }

    pub fn deny(requirement: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(false, requirement, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_creation() {
        let decision = AccessDecision::allow("action:users:read scopes:");
        assert!(decision.allowed);
        assert!(!decision.id.is_empty());

        let deny = AccessDecision::deny("action:users:read scopes:", "missing permission");
        assert!(!deny.allowed);
        assert_eq!(deny.reason, "missing permission");
        assert_ne!(decision.id, deny.id);
    }
}
