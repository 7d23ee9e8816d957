//! Testing utilities for descriptor tables and validators.
//!
//! This module provides:
//! - Sample descriptors, custom rule, overrides, and records
//! - Assertions over validation results and field error maps

pub mod fixtures;
mod assertions;

pub use assertions::{
    assert_error_paths, assert_field_error, assert_no_field_error, assert_valid,
    unwrap_field_errors,
};
pub use fixtures::{
    min_ten_rule, record, sample_overrides, sample_record, sample_record_with, sample_registry,
    sample_table, sample_validator,
};
