/// Granted scope matching
///
/// A granted scope either names a resource exactly (`datasources:id:1`) or ends
/// in a wildcard (`datasources:*`) and then covers every scope sharing its prefix.

use tracing::{debug, error};

use crate::error::Result;

/// Wildcard character, only valid in the last position
pub const WILDCARD: char = '*';

/// Meta-characters that must not appear before the last position
const META_CHARACTERS: [char; 2] = ['*', '?'];

/// Checks that a scope only uses meta-characters in its last position
pub fn validate_scope(scope: &str) -> bool {
    let mut chars = scope.chars();
    chars.next_back();
    !chars.as_str().contains(META_CHARACTERS)
}

/// Matches a granted scope against a required scope
///
/// Invalid granted scopes are logged and never match. The `Result` is part of
/// the matching contract; no current rule produces an error.
pub fn match_scope(granted: &str, required: &str) -> Result<bool> {
    if granted.is_empty() {
        return Ok(false);
    }

    if !validate_scope(granted) {
        error!(
            scope = granted,
            reason = "scopes should not contain meta-characters like * or ?, except in the last position",
            "invalid scope"
        );
        return Ok(false);
    }

    if let Some(prefix) = granted.strip_suffix(WILDCARD) {
        if required.starts_with(prefix) {
            debug!(granted, required, "matched scope");
            return Ok(true);
        }
    }

    Ok(granted == required)
}
