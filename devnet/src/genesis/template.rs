//! `${NAME}` placeholder substitution for generator config templates.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors raised while filling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a variable that was not supplied.
    #[error("template references unknown variable `{0}`")]
    UnknownVariable(String),
    /// A `${` has no closing brace.
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

/// Values substituted into a template, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData(BTreeMap<&'static str, String>);

impl TemplateData {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing any previous one with the same name.
    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.0.insert(name, value.to_string());
        self
    }

    /// Looks up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Replaces every `${NAME}` in `template` with its value from `data`.
///
/// Rendering is a pure function of its inputs. Unknown names and unterminated
/// placeholders are errors, so a half-filled template is never produced.
pub fn render(template: &str, data: &TemplateData) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(TemplateError::Unterminated(offset + start))?;
        let name = &after[..end];
        let value =
            data.get(name).ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
        out.push_str(value);

        let consumed = start + 2 + end + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }
    out.push_str(rest);

    Ok(out)
}
