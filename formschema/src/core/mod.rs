//! Core building blocks shared by the compiler and the validation engine.
//!
//! This module contains:
//! - The base kind enum
//! - Per-kind value casting
//! - Message templates and field path helpers

mod cast;
mod kind;
mod message;

pub use cast::{cast_value, format_date, number_value, parse_date, type_error};
pub use kind::BaseKind;
pub use message::{child_path, display_list, display_value, index_path, interpolate, ROOT_LABEL};
