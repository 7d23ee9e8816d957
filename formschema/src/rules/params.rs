//! Positional rule parameter decoding.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::core::parse_date;
use crate::errors::SchemaError;

/// Typed view over a descriptor rule's positional parameters.
pub(crate) struct Params<'a> {
    field: &'a str,
    rule: &'a str,
    values: &'a [Value],
}

impl<'a> Params<'a> {
    pub(crate) const fn new(field: &'a str, rule: &'a str, values: &'a [Value]) -> Self {
        Self { field, rule, values }
    }

    pub(crate) fn error(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::invalid_params(self.field, self.rule, reason)
    }

    fn required(&self, index: usize, expected: &str) -> Result<&'a Value, SchemaError> {
        self.values
            .get(index)
            .ok_or_else(|| self.error(format!("missing {expected} at position {index}")))
    }

    /// A finite number, or a string holding one.
    pub(crate) fn number(&self, index: usize) -> Result<f64, SchemaError> {
        let value = self.required(index, "number")?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.error(format!("expected a number at position {index}, got {value}")))
    }

    /// A non-negative integer.
    pub(crate) fn count(&self, index: usize) -> Result<usize, SchemaError> {
        let value = self.required(index, "count")?;
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                self.error(format!(
                    "expected a non-negative integer at position {index}, got {value}"
                ))
            })
    }

    /// A date string or epoch milliseconds.
    pub(crate) fn date(&self, index: usize) -> Result<DateTime<Utc>, SchemaError> {
        let value = self.required(index, "date")?;
        parse_date(value)
            .ok_or_else(|| self.error(format!("expected a date at position {index}, got {value}")))
    }

    pub(crate) fn string(&self, index: usize) -> Result<&'a str, SchemaError> {
        let value = self.required(index, "string")?;
        value
            .as_str()
            .ok_or_else(|| self.error(format!("expected a string at position {index}, got {value}")))
    }

    pub(crate) fn list(&self, index: usize) -> Result<Vec<Value>, SchemaError> {
        let value = self.required(index, "array")?;
        value
            .as_array()
            .cloned()
            .ok_or_else(|| self.error(format!("expected an array at position {index}, got {value}")))
    }

    pub(crate) fn value(&self, index: usize) -> Result<Value, SchemaError> {
        self.required(index, "value").cloned()
    }

    /// An optional message; absent and `null` both mean "use the default".
    pub(crate) fn message(&self, index: usize) -> Result<Option<String>, SchemaError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.error(format!(
                "expected a message string at position {index}, got {other}"
            ))),
        }
    }

    /// `matches` options: either a message string or
    /// `{ "message": .., "excludeEmptyString": .. }`.
    pub(crate) fn match_options(&self, index: usize) -> Result<(Option<String>, bool), SchemaError> {
        match self.values.get(index) {
            Some(Value::Object(options)) => {
                let message = match options.get("message") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => {
                        return Err(self.error(format!("expected a message string, got {other}")))
                    }
                };
                let exclude_empty = options
                    .get("excludeEmptyString")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok((message, exclude_empty))
            }
            _ => Ok((self.message(index)?, false)),
        }
    }
}
