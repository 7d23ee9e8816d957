//! Evaluation of built-in tests.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{Limit, Rule};
use crate::core::{display_list, interpolate, parse_date, BaseKind};
use crate::errors::ValidationFailure;

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(https?|ftp)://[^\s/$.?#][^\s]*$").expect("url pattern is valid")
});

/// Magnitude compared by `min` / `max` / `length` for a value of `kind`.
#[allow(clippy::cast_precision_loss)]
fn size_of(kind: BaseKind, value: &Value) -> Option<f64> {
    match (kind, value) {
        (BaseKind::String, Value::String(s)) => Some(s.chars().count() as f64),
        (BaseKind::Array, Value::Array(items)) => Some(items.len() as f64),
        (BaseKind::Number, Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

impl Rule {
    /// Runs a built-in test against a present, already cast value of `kind`.
    ///
    /// Returns `None` when the value passes. Presence rules and custom rules
    /// always pass here; the engine handles them.
    #[must_use]
    pub fn check(&self, kind: BaseKind, value: &Value, path: &str) -> Option<ValidationFailure> {
        let (default_message, params, message) = match self {
            Self::Min { limit, message } => {
                let passed = match limit {
                    Limit::Number(min) => size_of(kind, value).map_or(true, |n| n >= *min),
                    Limit::Date(min) => parse_date(value).map_or(true, |d| d >= *min),
                };
                if passed {
                    return None;
                }
                let template = match kind {
                    BaseKind::String => "${path} must be at least ${min} characters",
                    BaseKind::Array => "${path} field must have at least ${min} items",
                    BaseKind::Date => "${path} field must be later than ${min}",
                    _ => "${path} must be greater than or equal to ${min}",
                };
                (template, vec![("min", limit.display())], message)
            }
            Self::Max { limit, message } => {
                let passed = match limit {
                    Limit::Number(max) => size_of(kind, value).map_or(true, |n| n <= *max),
                    Limit::Date(max) => parse_date(value).map_or(true, |d| d <= *max),
                };
                if passed {
                    return None;
                }
                let template = match kind {
                    BaseKind::String => "${path} must be at most ${max} characters",
                    BaseKind::Array => "${path} field must have less than or equal to ${max} items",
                    BaseKind::Date => "${path} field must be at earlier than ${max}",
                    _ => "${path} must be less than or equal to ${max}",
                };
                (template, vec![("max", limit.display())], message)
            }
            Self::Length { length, message } => {
                #[allow(clippy::cast_precision_loss)]
                let expected = *length as f64;
                if size_of(kind, value).map_or(true, |n| n == expected) {
                    return None;
                }
                let template = if kind == BaseKind::Array {
                    "${path} must have ${length} items"
                } else {
                    "${path} must be exactly ${length} characters"
                };
                (template, vec![("length", length.to_string())], message)
            }
            Self::LessThan { limit, message } => {
                if value.as_f64().map_or(true, |n| n < *limit) {
                    return None;
                }
                ("${path} must be less than ${less}", vec![("less", limit.to_string())], message)
            }
            Self::MoreThan { limit, message } => {
                if value.as_f64().map_or(true, |n| n > *limit) {
                    return None;
                }
                ("${path} must be greater than ${more}", vec![("more", limit.to_string())], message)
            }
            Self::Positive { message } => {
                if value.as_f64().map_or(true, |n| n > 0.0) {
                    return None;
                }
                ("${path} must be a positive number", Vec::new(), message)
            }
            Self::Negative { message } => {
                if value.as_f64().map_or(true, |n| n < 0.0) {
                    return None;
                }
                ("${path} must be a negative number", Vec::new(), message)
            }
            Self::Integer { message } => {
                if value.as_f64().map_or(true, |n| n.fract() == 0.0) {
                    return None;
                }
                ("${path} must be an integer", Vec::new(), message)
            }
            Self::Email { message } => {
                if value.as_str().map_or(true, |s| s.is_empty() || EMAIL.is_match(s)) {
                    return None;
                }
                ("${path} must be a valid email", Vec::new(), message)
            }
            Self::Url { message } => {
                if value.as_str().map_or(true, |s| s.is_empty() || URL.is_match(s)) {
                    return None;
                }
                ("${path} must be a valid URL", Vec::new(), message)
            }
            Self::Uuid { message } => {
                let valid = |s: &str| s.len() == 36 && uuid::Uuid::parse_str(s).is_ok();
                if value.as_str().map_or(true, |s| s.is_empty() || valid(s)) {
                    return None;
                }
                ("${path} must be a valid UUID", Vec::new(), message)
            }
            Self::Matches {
                pattern,
                exclude_empty,
                message,
            } => {
                let passed = value
                    .as_str()
                    .map_or(true, |s| (s.is_empty() && *exclude_empty) || pattern.is_match(s));
                if passed {
                    return None;
                }
                (
                    "${path} must match the following: \"${regex}\"",
                    vec![("regex", pattern.as_str().to_string())],
                    message,
                )
            }
            Self::Trim { message } => {
                if value.as_str().map_or(true, |s| s == s.trim()) {
                    return None;
                }
                ("${path} must be a trimmed string", Vec::new(), message)
            }
            Self::Lowercase { message } => {
                if value.as_str().map_or(true, |s| s == s.to_lowercase()) {
                    return None;
                }
                ("${path} must be a lowercase string", Vec::new(), message)
            }
            Self::Uppercase { message } => {
                if value.as_str().map_or(true, |s| s == s.to_uppercase()) {
                    return None;
                }
                ("${path} must be a upper case string", Vec::new(), message)
            }
            Self::OneOf { values, message } => {
                if values.contains(value) {
                    return None;
                }
                (
                    "${path} must be one of the following values: ${values}",
                    vec![("values", display_list(values))],
                    message,
                )
            }
            Self::NotOneOf { values, message } => {
                if !values.contains(value) {
                    return None;
                }
                (
                    "${path} must not be one of the following values: ${values}",
                    vec![("values", display_list(values))],
                    message,
                )
            }
            Self::IsTrue { message } => {
                if value.as_bool() != Some(false) {
                    return None;
                }
                ("${path} field must be true", Vec::new(), message)
            }
            Self::IsFalse { message } => {
                if value.as_bool() != Some(true) {
                    return None;
                }
                ("${path} field must be false", Vec::new(), message)
            }
            Self::Required { .. }
            | Self::NotRequired
            | Self::Defined { .. }
            | Self::Nullable
            | Self::Default(_)
            | Self::Custom { .. } => return None,
        };

        let template = message.as_deref().unwrap_or(default_message);
        Some(
            ValidationFailure::new(path, self.name(), interpolate(template, path, &params))
                .with_value(value.clone()),
        )
    }

    /// Applies the transform a rule implies in non-strict mode.
    pub(crate) fn transform(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Trim { .. }, Value::String(s)) => Value::String(s.trim().to_string()),
            (Self::Lowercase { .. }, Value::String(s)) => Value::String(s.to_lowercase()),
            (Self::Uppercase { .. }, Value::String(s)) => Value::String(s.to_uppercase()),
            (_, value) => value,
        }
    }
}
