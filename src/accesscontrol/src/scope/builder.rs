/// Scope construction helpers used by policy authors

/// Scope segment separator
pub const SEPARATOR: char = ':';

/// Joins scope parts with the separator
///
/// # Examples
///
/// ```
/// use cretoai_accesscontrol::scope::scope;
///
/// assert_eq!(scope(&["datasources", "name", "testds"]), "datasources:name:testds");
/// ```
pub fn scope(parts: &[&str]) -> String {
    parts.join(":")
}

/// Template placeholder for a field of the injected parameters
pub fn field(key: &str) -> String {
    format!("{{{{ .{} }}}}", key)
}

/// Template placeholder for a URL parameter of the injected parameters
pub fn parameter(key: &str) -> String {
    format!("{{{{ index .URLParams \"{}\" }}}}", key)
}

/// Returns the scope through its second separator
///
/// Scopes with fewer than two separators are returned unchanged:
/// `"datasources:name:testds"` gives `"datasources:name:"`, `"datasources:"`
/// stays `"datasources:"`.
pub fn scope_prefix(scope: &str) -> &str {
    match scope.match_indices(SEPARATOR).nth(1) {
        Some((idx, _)) => &scope[..=idx],
        None => scope,
    }
}
