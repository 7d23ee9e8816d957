//! The composite validator: an ordered set of named field schemas.

use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::config::ValidateOptions;
use crate::core::{type_error, BaseKind, ROOT_LABEL};
use crate::errors::{FieldError, FieldErrorMap, SchemaError, ValidationError, ValidationFailure};
use crate::logging::SpanTimer;
use crate::schema::engine::{run_record, ExecMode};
use crate::schema::{Record, Schema, SchemaDescription};

/// Field id to schema, in declaration order.
///
/// Built by the compiler and refined with [`CompositeValidator::merge_overrides`].
/// Validation never mutates it, so one validator can serve concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct CompositeValidator {
    fields: Vec<(String, Schema)>,
}

impl CompositeValidator {
    /// Creates an empty validator. Every record passes it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema for `id`. An existing entry is replaced in place.
    pub fn insert(&mut self, id: impl Into<String>, schema: Schema) -> Option<Schema> {
        let id = id.into();
        match self.fields.iter_mut().find(|(key, _)| *key == id) {
            Some((_, existing)) => Some(std::mem::replace(existing, schema)),
            None => {
                self.fields.push((id, schema));
                None
            }
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_field(mut self, id: impl Into<String>, schema: Schema) -> Self {
        self.insert(id, schema);
        self
    }

    /// Returns the schema for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Schema> {
        self.fields
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, schema)| schema)
    }

    /// True when `id` has a schema.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field ids in order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Iterates over `(id, schema)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(key, schema)| (key.as_str(), schema))
    }

    /// Returns a validator with every field of `self`, then every field of
    /// `overrides` on top. Overrides win on collision and keep the original
    /// position; new ids append.
    #[must_use]
    pub fn merge_overrides(&self, overrides: &CompositeValidator) -> Self {
        let mut merged = self.clone();
        for (id, schema) in &overrides.fields {
            merged.insert(id.clone(), schema.clone());
        }
        merged
    }

    /// Serializable summary of every field.
    #[must_use]
    pub fn describe(&self) -> Vec<(String, SchemaDescription)> {
        self.fields
            .iter()
            .map(|(key, schema)| (key.clone(), schema.describe()))
            .collect()
    }

    /// Validates `record`, awaiting asynchronous custom rules.
    ///
    /// Returns the cast record on success. Field failures come back as
    /// [`ValidationError::Invalid`]; fatal problems as [`ValidationError::Schema`].
    pub async fn validate(
        &self,
        record: &Record,
        options: &ValidateOptions,
    ) -> Result<Record, ValidationError> {
        let timer = SpanTimer::start("validate");
        let outcome = run_record(&self.fields, record, options, ExecMode::Async).await;
        self.conclude(outcome, options, timer)
    }

    /// Validates `record` without suspending.
    ///
    /// Fails with [`SchemaError::AsyncRuleInSyncRun`] if any field reaches an
    /// asynchronous custom rule.
    pub fn validate_sync(
        &self,
        record: &Record,
        options: &ValidateOptions,
    ) -> Result<Record, ValidationError> {
        let timer = SpanTimer::start("validate_sync");
        let outcome = run_record(&self.fields, record, options, ExecMode::Sync)
            .now_or_never()
            .unwrap_or_else(|| {
                Err(SchemaError::Internal(
                    "synchronous validation suspended".to_string(),
                ))
            });
        self.conclude(outcome, options, timer)
    }

    /// Validates a JSON value, which must be an object.
    pub async fn validate_value(
        &self,
        value: &Value,
        options: &ValidateOptions,
    ) -> Result<Record, ValidationError> {
        match value {
            Value::Object(record) => self.validate(record, options).await,
            other => Err(not_a_record(other)),
        }
    }

    /// True when `record` passes. Fatal errors still propagate.
    pub async fn is_valid(
        &self,
        record: &Record,
        options: &ValidateOptions,
    ) -> Result<bool, SchemaError> {
        match self.validate(record, options).await {
            Ok(_) => Ok(true),
            Err(ValidationError::Invalid(_)) => Ok(false),
            Err(ValidationError::Schema(err)) => Err(err),
        }
    }

    fn conclude(
        &self,
        outcome: Result<Result<Record, ValidationFailure>, SchemaError>,
        options: &ValidateOptions,
        timer: SpanTimer,
    ) -> Result<Record, ValidationError> {
        let name = timer.name().to_string();
        let duration_ms = timer.finish();
        match outcome? {
            Ok(record) => {
                debug!(
                    run = %name,
                    fields = self.fields.len(),
                    collect_all = options.collect_all,
                    duration_ms,
                    "Record valid"
                );
                Ok(record)
            }
            Err(failure) => {
                let errors = FieldErrorMap::from_failure(&failure);
                debug!(
                    run = %name,
                    fields = self.fields.len(),
                    collect_all = options.collect_all,
                    errors = errors.len(),
                    duration_ms,
                    "Record invalid"
                );
                Err(ValidationError::Invalid(errors))
            }
        }
    }
}

/// Right-biased merge of two validators. See
/// [`CompositeValidator::merge_overrides`].
#[must_use]
pub fn merge_overrides(
    compiled: &CompositeValidator,
    overrides: &CompositeValidator,
) -> CompositeValidator {
    compiled.merge_overrides(overrides)
}

fn not_a_record(value: &Value) -> ValidationError {
    let failure = type_error(BaseKind::Object, "", value);
    let mut errors = FieldErrorMap::new();
    errors.insert(ROOT_LABEL, FieldError::new(failure.kind, failure.message));
    ValidationError::Invalid(errors)
}

impl<K: Into<String>> FromIterator<(K, Schema)> for CompositeValidator {
    fn from_iter<I: IntoIterator<Item = (K, Schema)>>(iter: I) -> Self {
        let mut validator = Self::new();
        for (id, schema) in iter {
            validator.insert(id, schema);
        }
        validator
    }
}
