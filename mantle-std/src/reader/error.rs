//! Validation results.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Identifies a field of a record or an element of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// A record field.
    Name(String),
    /// A list element.
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => f.write_str(name),
            FieldKey::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A single field failure, with the path that leads to it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    path: Vec<FieldKey>,
}

impl ValidationError {
    /// Create an error with an empty path.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// The human-readable failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Keys from the outermost field down to the failing value.
    pub fn path(&self) -> &[FieldKey] {
        &self.path
    }

    /// The path rendered as `address.lines[2]`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for key in &self.path {
            if let FieldKey::Name(_) = key {
                if !out.is_empty() {
                    out.push('.');
                }
            }
            out.push_str(&key.to_string());
        }
        out
    }

    /// Prefix the path with `key`.
    pub(crate) fn within(mut self, key: FieldKey) -> Self {
        self.path.insert(0, key);
        self
    }
}

/// All field failures of one read, keyed by top-level field name.
///
/// Failures that concern the input as a whole (not a record, malformed JSON)
/// are stored under [`FieldErrors::INPUT_KEY`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, ValidationError>);

impl FieldErrors {
    /// The reserved key for whole-input failures.
    pub const INPUT_KEY: &'static str = "_";

    /// Errors consisting of a single whole-input failure.
    pub fn input(error: ValidationError) -> Self {
        let mut errors = Self::default();
        errors.insert(Self::INPUT_KEY, error);
        errors
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, error: ValidationError) {
        self.0.insert(field.into(), error);
    }

    /// The failure recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.get(field)
    }

    /// Whether `field` failed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.0.iter().map(|(field, error)| (field.as_str(), error))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_string() {
        let err = ValidationError::new("Expected a string")
            .within(FieldKey::Index(2))
            .within(FieldKey::Name("lines".into()))
            .within(FieldKey::Name("address".into()));
        assert_eq!(err.path_string(), "address.lines[2]");
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.insert("b", ValidationError::new("too long"));
        errors.insert("a", ValidationError::new("required"));
        assert_eq!(errors.to_string(), "a: required; b: too long");
    }
}
