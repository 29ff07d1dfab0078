/// Minimal scope template expansion
///
/// Scopes may embed placeholders such as `{{ .UserId }}` or
/// `{{ index .URLParams ":id" }}`. Only these two action forms exist; anything
/// else between braces is a syntax error. Well-formed placeholders whose field
/// or key is unknown to the data source are kept as literal text.

use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Template syntax errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed action at offset {0}")]
    Unclosed(usize),

    #[error("empty action at offset {0}")]
    EmptyAction(usize),

    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),
}

/// Values available to template placeholders
pub trait TemplateData {
    /// Value for `{{ .name }}`
    fn field(&self, name: &str) -> Option<String>;

    /// Value for `{{ index .name "key" }}`
    fn index(&self, _name: &str, _key: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Field(&'a str),
    Index(&'a str, &'a str),
}

/// Expands every placeholder in `template` against `data`
pub fn expand<D: TemplateData + ?Sized>(template: &str, data: &D) -> Result<String, TemplateError> {
    if !template.contains(OPEN) {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);

        let body_start = start + OPEN.len();
        let end = rest[body_start..]
            .find(CLOSE)
            .ok_or(TemplateError::Unclosed(offset + start))?;
        let raw = &rest[start..body_start + end + CLOSE.len()];
        let body = rest[body_start..body_start + end].trim();

        let value = match parse_action(body, offset + start)? {
            Action::Field(name) => data.field(name),
            Action::Index(name, key) => data.index(name, key),
        };
        out.push_str(value.as_deref().unwrap_or(raw));

        let consumed = body_start + end + CLOSE.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    out.push_str(rest);
    Ok(out)
}

fn parse_action(body: &str, offset: usize) -> Result<Action<'_>, TemplateError> {
    if body.is_empty() {
        return Err(TemplateError::EmptyAction(offset));
    }

    if let Some(name) = body.strip_prefix('.') {
        if is_identifier(name) {
            return Ok(Action::Field(name));
        }
        return Err(TemplateError::UnsupportedAction(body.to_string()));
    }

    let mut words = body.split_whitespace();
    if let (Some("index"), Some(map), Some(key), None) =
        (words.next(), words.next(), words.next(), words.next())
    {
        let name = map.strip_prefix('.').filter(|n| is_identifier(n));
        let key = key
            .strip_prefix('"')
            .and_then(|k| k.strip_suffix('"'))
            .filter(|k| !k.contains('"'));
        if let (Some(name), Some(key)) = (name, key) {
            return Ok(Action::Index(name, key));
        }
    }

    Err(TemplateError::UnsupportedAction(body.to_string()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
