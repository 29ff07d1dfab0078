//! Access control configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AccessControlError, Result};

/// Environment variable holding the attribute lookup timeout in milliseconds
pub const ENV_LOOKUP_TIMEOUT_MS: &str = "ACCESSCONTROL_LOOKUP_TIMEOUT_MS";
pub const ENV_RESOLVE_KEYWORDS: &str = "ACCESSCONTROL_RESOLVE_KEYWORDS";
pub const ENV_RESOLVE_ATTRIBUTES: &str = "ACCESSCONTROL_RESOLVE_ATTRIBUTES";
pub const ENV_ENABLE_METRICS: &str = "ACCESSCONTROL_ENABLE_METRICS";

/// Access control configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlConfig {
    /// Upper bound for a single attribute lookup
    pub lookup_timeout: Duration,

    /// Substitute keywords such as `users:self`
    pub resolve_keywords: bool,

    /// Resolve attribute scopes through registered resolvers
    pub resolve_attributes: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
            resolve_keywords: true,
            resolve_attributes: true,
            enable_metrics: true,
        }
    }
}

impl AccessControlConfig {
    /// Load configuration from the environment, keeping defaults for unset variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let lookup_timeout = match parse::<u64>(&lookup, ENV_LOOKUP_TIMEOUT_MS)? {
            Some(0) => {
                return Err(AccessControlError::Config(format!(
                    "{} must be greater than zero",
                    ENV_LOOKUP_TIMEOUT_MS
                )))
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.lookup_timeout,
        };

        Ok(Self {
            lookup_timeout,
            resolve_keywords: parse(&lookup, ENV_RESOLVE_KEYWORDS)?.unwrap_or(defaults.resolve_keywords),
            resolve_attributes: parse(&lookup, ENV_RESOLVE_ATTRIBUTES)?
                .unwrap_or(defaults.resolve_attributes),
            enable_metrics: parse(&lookup, ENV_ENABLE_METRICS)?.unwrap_or(defaults.enable_metrics),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AccessControlError::Config(format!("invalid {}='{}': {}", key, raw, e))),
        None => Ok(None),
    }
}
