//! Value casting per base kind.
//!
//! In non-strict mode values are coerced toward the field's kind the way form
//! input usually needs (`"4"` becomes `4`, `"true"` becomes `true`). In strict
//! mode only values already of the right JSON shape are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use super::kind::BaseKind;
use super::message::interpolate;
use crate::errors::ValidationFailure;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Casts a present, non-null value to `kind`. Returns `None` when it cannot.
#[must_use]
pub fn cast_value(kind: BaseKind, value: &Value, strict: bool) -> Option<Value> {
    match kind {
        BaseKind::String => cast_string(value, strict),
        BaseKind::Number => cast_number(value, strict),
        BaseKind::Boolean => cast_boolean(value, strict),
        BaseKind::Date => cast_date(value, strict),
        BaseKind::Array => value.is_array().then(|| value.clone()),
        BaseKind::Object => value.is_object().then(|| value.clone()),
    }
}

/// Builds the `typeError` failure for a value that could not be cast.
#[must_use]
pub fn type_error(kind: BaseKind, path: &str, value: &Value) -> ValidationFailure {
    let message = interpolate(
        "${path} must be a `${type}` type, but the final value was: `${value}`.",
        path,
        &[("type", kind.to_string()), ("value", value.to_string())],
    );
    ValidationFailure::new(path, "typeError", message).with_value(value.clone())
}

/// Parses a date from an RFC3339 string, a `YYYY-MM-DD` string, a naive
/// `YYYY-MM-DDTHH:MM:SS` string, or epoch milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats a date the way cast records carry it.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Converts an `f64` into a JSON number, preferring an integer representation.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}

fn cast_string(value: &Value, strict: bool) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) if !strict => Some(Value::String(n.to_string())),
        Value::Bool(b) if !strict => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn cast_number(value: &Value, strict: bool) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) if !strict => s.trim().parse::<f64>().ok().and_then(number_value),
        _ => None,
    }
}

fn cast_boolean(value: &Value, strict: bool) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) if !strict => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Number(n) if !strict => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn cast_date(value: &Value, strict: bool) -> Option<Value> {
    if strict {
        return match value {
            Value::String(s) if parse_date_str(s).is_some() => Some(value.clone()),
            _ => None,
        };
    }
    parse_date(value).map(|date| Value::String(format_date(&date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_number_from_string() {
        assert_eq!(cast_value(BaseKind::Number, &json!("4"), false), Some(json!(4)));
        assert_eq!(cast_value(BaseKind::Number, &json!(" 2.5 "), false), Some(json!(2.5)));
        assert_eq!(cast_value(BaseKind::Number, &json!("abc"), false), None);
        assert_eq!(cast_value(BaseKind::Number, &json!(""), false), None);
        assert_eq!(cast_value(BaseKind::Number, &json!("inf"), false), None);
    }

    #[test]
    fn test_number_strict() {
        assert_eq!(cast_value(BaseKind::Number, &json!("4"), true), None);
        assert_eq!(cast_value(BaseKind::Number, &json!(4), true), Some(json!(4)));
    }

    #[test]
    fn test_string_from_scalars() {
        assert_eq!(cast_value(BaseKind::String, &json!(12), false), Some(json!("12")));
        assert_eq!(cast_value(BaseKind::String, &json!(true), false), Some(json!("true")));
        assert_eq!(cast_value(BaseKind::String, &json!([1]), false), None);
        assert_eq!(cast_value(BaseKind::String, &json!(12), true), None);
    }

    #[test]
    fn test_boolean_from_strings_and_numbers() {
        assert_eq!(cast_value(BaseKind::Boolean, &json!("TRUE"), false), Some(json!(true)));
        assert_eq!(cast_value(BaseKind::Boolean, &json!("0"), false), Some(json!(false)));
        assert_eq!(cast_value(BaseKind::Boolean, &json!(1), false), Some(json!(true)));
        assert_eq!(cast_value(BaseKind::Boolean, &json!("yes"), false), None);
        assert_eq!(cast_value(BaseKind::Boolean, &json!(2), false), None);
    }

    #[test]
    fn test_date_normalization() {
        assert_eq!(
            cast_value(BaseKind::Date, &json!("2024-03-01"), false),
            Some(json!("2024-03-01T00:00:00.000Z"))
        );
        assert_eq!(
            cast_value(BaseKind::Date, &json!("2024-03-01T12:30:00+02:00"), false),
            Some(json!("2024-03-01T10:30:00.000Z"))
        );
        assert_eq!(
            cast_value(BaseKind::Date, &json!(0), false),
            Some(json!("1970-01-01T00:00:00.000Z"))
        );
        assert_eq!(cast_value(BaseKind::Date, &json!("not a date"), false), None);
    }

    #[test]
    fn test_date_strict_keeps_original() {
        assert_eq!(
            cast_value(BaseKind::Date, &json!("2024-03-01"), true),
            Some(json!("2024-03-01"))
        );
        assert_eq!(cast_value(BaseKind::Date, &json!(0), true), None);
    }

    #[test]
    fn test_containers() {
        assert_eq!(cast_value(BaseKind::Array, &json!([{}]), false), Some(json!([{}])));
        assert_eq!(cast_value(BaseKind::Array, &json!({}), false), None);
        assert_eq!(cast_value(BaseKind::Object, &json!({"a": 1}), false), Some(json!({"a": 1})));
        assert_eq!(cast_value(BaseKind::Object, &json!("{}"), false), None);
    }

    #[test]
    fn test_type_error_message() {
        let failure = type_error(BaseKind::Number, "total", &json!("abc"));
        assert_eq!(failure.kind, "typeError");
        assert_eq!(failure.path, "total");
        assert_eq!(
            failure.message,
            "total must be a `number` type, but the final value was: `\"abc\"`."
        );
    }
}
