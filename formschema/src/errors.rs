//! Error types for formschema.
//!
//! Two families live here:
//! - [`SchemaError`]: fatal problems (malformed rule parameters, unreadable
//!   descriptor tables, async rules in a synchronous run). These are never
//!   normalized and always propagate to the caller.
//! - [`ValidationFailure`] / [`FieldErrorMap`]: structured failures produced by
//!   a validation run, and their flattened per-field form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fatal errors raised while loading, compiling, or running a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A known rule was given parameters it cannot use.
    #[error("Invalid parameters for rule '{rule}' on field '{field}': {reason}")]
    InvalidRuleParams {
        /// The descriptor id.
        field: String,
        /// The rule name.
        rule: String,
        /// Why the parameters were rejected.
        reason: String,
    },

    /// A synchronous run reached a custom rule whose test is asynchronous.
    #[error("Validation test '{rule}' is asynchronous and cannot run during a synchronous validation")]
    AsyncRuleInSyncRun {
        /// The custom rule name.
        rule: String,
    },

    /// The descriptor table could not be deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while reading a descriptor table.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchemaError {
    /// Creates an invalid rule params error.
    #[must_use]
    pub fn invalid_params(
        field: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRuleParams {
            field: field.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

/// Error returned by a validation run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more fields failed their constraints.
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(FieldErrorMap),

    /// Something outside the structured failure shape went wrong.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ValidationError {
    /// Returns the field errors when this is a structured failure.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrorMap> {
        match self {
            Self::Invalid(map) => Some(map),
            Self::Schema(_) => None,
        }
    }

    /// Consumes the error, yielding the field errors or re-raising a fatal error.
    pub fn into_field_errors(self) -> Result<FieldErrorMap, SchemaError> {
        match self {
            Self::Invalid(map) => Ok(map),
            Self::Schema(err) => Err(err),
        }
    }
}

/// A raw validation failure as produced by the engine.
///
/// A failure collected in collect-all mode is an aggregate whose `inner` list
/// holds one failure per failing test. An abort-early failure has no inner list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Field path (`name`, `metadata.variants[0].color`), empty for the root.
    pub path: String,
    /// Machine-readable failure kind (`required`, `min`, `typeError`, ...).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// The value that failed.
    #[serde(default)]
    pub value: serde_json::Value,
    /// Collected inner failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner: Vec<ValidationFailure>,
}

impl ValidationFailure {
    /// Creates a single failure.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            message: message.into(),
            value: serde_json::Value::Null,
            inner: Vec::new(),
        }
    }

    /// Attaches the offending value.
    #[must_use]
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = value;
        self
    }

    /// Wraps collected failures in an aggregate.
    #[must_use]
    pub fn aggregate(inner: Vec<ValidationFailure>) -> Self {
        let message = if inner.len() == 1 {
            "1 error occurred".to_string()
        } else {
            format!("{} errors occurred", inner.len())
        };
        Self {
            path: String::new(),
            kind: "aggregate".to_string(),
            message,
            value: serde_json::Value::Null,
            inner,
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationFailure {}

/// The displayable error attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Machine-readable failure kind.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Field path to error, one entry per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrorMap(BTreeMap<String, FieldError>);

impl FieldErrorMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a raw failure.
    ///
    /// With an inner list each inner failure contributes an entry keyed by its
    /// path, keeping the first failure reported for a path. Without one, a
    /// failure that has both a path and a message contributes a single entry.
    #[must_use]
    pub fn from_failure(failure: &ValidationFailure) -> Self {
        let mut map = Self::new();
        if failure.inner.is_empty() {
            if !failure.path.is_empty() && !failure.message.is_empty() {
                map.insert(&failure.path, FieldError::new(&failure.kind, &failure.message));
            }
            return map;
        }
        for inner in &failure.inner {
            map.0
                .entry(inner.path.clone())
                .or_insert_with(|| FieldError::new(&inner.kind, &inner.message));
        }
        map
    }

    /// Inserts or replaces the entry for a path.
    pub fn insert(&mut self, path: impl Into<String>, error: FieldError) {
        self.0.insert(path.into(), error);
    }

    /// Returns the entry for a path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.0.get(path)
    }

    /// True if a path has an entry.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.0.iter()
    }

    /// Returns the failing paths.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Unwraps the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, FieldError> {
        self.0
    }
}

impl From<&ValidationFailure> for FieldErrorMap {
    fn from(failure: &ValidationFailure) -> Self {
        Self::from_failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_params_display() {
        let err = SchemaError::invalid_params("name", "min", "expected a number");
        assert_eq!(
            err.to_string(),
            "Invalid parameters for rule 'min' on field 'name': expected a number"
        );
    }

    #[test]
    fn test_normalize_single_failure() {
        let failure = ValidationFailure::new("email", "email", "please enter a valid email");
        let map = FieldErrorMap::from_failure(&failure);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("email"),
            Some(&FieldError::new("email", "please enter a valid email"))
        );
    }

    #[test]
    fn test_normalize_single_failure_without_path() {
        let failure = ValidationFailure::new("", "typeError", "this must be an object");
        assert!(FieldErrorMap::from_failure(&failure).is_empty());
    }

    #[test]
    fn test_normalize_aggregate_keeps_first_per_path() {
        let failure = ValidationFailure::aggregate(vec![
            ValidationFailure::new("name", "required", "this field is required"),
            ValidationFailure::new("name", "min", "name cannot be less than 5 characters"),
            ValidationFailure::new("total", "max", "max family members can be 5"),
        ]);
        let map = FieldErrorMap::from_failure(&failure);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("name").map(|e| e.kind.as_str()), Some("required"));
        assert_eq!(map.get("total").map(|e| e.kind.as_str()), Some("max"));
        assert_eq!(map.paths(), vec!["name", "total"]);
    }

    #[test]
    fn test_aggregate_message() {
        let one = ValidationFailure::aggregate(vec![ValidationFailure::new("a", "min", "m")]);
        assert_eq!(one.message, "1 error occurred");

        let two = ValidationFailure::aggregate(vec![
            ValidationFailure::new("a", "min", "m"),
            ValidationFailure::new("b", "max", "m"),
        ]);
        assert_eq!(two.to_string(), "2 errors occurred");
    }

    #[test]
    fn test_field_error_map_serializes_flat() {
        let mut map = FieldErrorMap::new();
        map.insert("custom", FieldError::new("custom", "custom cannot be less than 10"));

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "custom": {"kind": "custom", "message": "custom cannot be less than 10"}
            })
        );
    }

    #[test]
    fn test_validation_error_into_field_errors() {
        let mut map = FieldErrorMap::new();
        map.insert("name", FieldError::new("required", "required"));
        let err = ValidationError::Invalid(map.clone());

        assert_eq!(err.to_string(), "1 field(s) failed validation");
        assert_eq!(err.field_errors(), Some(&map));
        assert_eq!(err.into_field_errors().unwrap(), map);

        let fatal = ValidationError::from(SchemaError::Internal("boom".to_string()));
        assert!(fatal.field_errors().is_none());
        assert!(fatal.into_field_errors().is_err());
    }
}
