//! Assertions for validation results.

use crate::errors::{FieldErrorMap, ValidationError};
use crate::schema::Record;

/// Asserts that validation succeeded.
pub fn assert_valid(result: &Result<Record, ValidationError>) {
    assert!(result.is_ok(), "Expected a valid record, got: {:?}", result.as_ref().err());
}

/// Returns the field errors of a failed run, panicking on success or on a
/// fatal error.
pub fn unwrap_field_errors(result: Result<Record, ValidationError>) -> FieldErrorMap {
    match result {
        Ok(record) => panic!("Expected field errors, but the record was valid: {record:?}"),
        Err(ValidationError::Schema(err)) => panic!("Expected field errors, got fatal error: {err}"),
        Err(ValidationError::Invalid(errors)) => errors,
    }
}

/// Asserts that `path` has an entry of `kind`, and of `message` when given.
pub fn assert_field_error(errors: &FieldErrorMap, path: &str, kind: &str, message: Option<&str>) {
    let Some(error) = errors.get(path) else {
        panic!("Expected an error for '{path}', got paths: {:?}", errors.paths());
    };
    assert_eq!(error.kind, kind, "Unexpected kind for '{path}'");
    if let Some(message) = message {
        assert_eq!(error.message, message, "Unexpected message for '{path}'");
    }
}

/// Asserts that `path` has no entry.
pub fn assert_no_field_error(errors: &FieldErrorMap, path: &str) {
    assert!(
        !errors.contains(path),
        "Expected no error for '{path}', got: {:?}",
        errors.get(path)
    );
}

/// Asserts that the map holds exactly `paths`, in any order.
pub fn assert_error_paths(errors: &FieldErrorMap, paths: &[&str]) {
    let mut expected = paths.to_vec();
    expected.sort_unstable();
    assert_eq!(errors.paths(), expected, "Unexpected error paths");
}
