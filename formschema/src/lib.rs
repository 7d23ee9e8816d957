//! # formschema
//!
//! Compile declarative field descriptor tables into validators and flatten
//! their failures into per-field error maps.
//!
//! formschema provides:
//!
//! - **Descriptor tables**: ordered field specs naming a base kind and rules
//! - **Schema compilation**: rule names resolve once into typed rules
//! - **Custom rules**: synchronous or asynchronous predicates in a registry
//! - **Override merging**: hand-built nested schemas on top of compiled ones
//! - **Error normalization**: one `{ kind, message }` entry per failing path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formschema::prelude::*;
//!
//! let table = DescriptorTable::from_json_str(r#"[
//!     {"id": "name", "validationType": "string",
//!      "validations": [{"type": "required", "params": ["this field is required"]}]}
//! ]"#)?;
//!
//! let validator = compile(&table)?;
//! match validator.validate(&record, &ValidateOptions::collect_all()).await {
//!     Ok(valid) => println!("{valid:?}"),
//!     Err(ValidationError::Invalid(errors)) => println!("{}", serde_json::to_string(&errors)?),
//!     Err(ValidationError::Schema(err)) => return Err(err.into()),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod compiler;
pub mod composite;
pub mod config;
pub mod core;
pub mod descriptor;
pub mod errors;
pub mod logging;
pub mod rules;
pub mod schema;
pub mod testing;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compiler::{compile, SchemaCompiler};
    pub use crate::composite::{merge_overrides, CompositeValidator};
    pub use crate::config::{LogFormat, LoggingConfig, ValidateOptions};
    pub use crate::core::BaseKind;
    pub use crate::descriptor::{DescriptorTable, FieldDescriptor, RuleSpec};
    pub use crate::errors::{
        FieldError, FieldErrorMap, SchemaError, ValidationError, ValidationFailure,
    };
    pub use crate::logging::init_logging;
    pub use crate::rules::{register_rule, AsyncRuleTest, CustomRule, RuleRegistry};
    pub use crate::schema::{Record, Schema};
}

pub use compiler::compile;
pub use rules::register_rule;
