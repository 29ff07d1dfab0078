//! Error types for access control evaluation and scope resolution

use std::time::Duration;
use thiserror::Error;

use crate::scope::TemplateError;

/// Access control errors
///
/// Any error surfacing from scope resolution or evaluation must be read as a
/// deny by the caller.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// Malformed placeholder in a scope template
    #[error("Invalid scope template: {0}")]
    Template(#[from] TemplateError),

    /// Data source lookup returned nothing
    #[error("Data source not found: {0}")]
    DataSourceNotFound(String),

    /// Attribute resolver failed
    #[error("Attribute lookup failed for scope '{scope}': {reason}")]
    AttributeLookup { scope: String, reason: String },

    /// Lookup aborted through its cancellation token
    #[error("Attribute lookup cancelled for scope '{0}'")]
    Cancelled(String),

    /// Lookup exceeded the configured deadline
    #[error("Attribute lookup for scope '{scope}' timed out after {timeout:?}")]
    Timeout { scope: String, timeout: Duration },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AccessControlError>;
