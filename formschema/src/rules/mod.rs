//! Rules and their resolution from descriptor names.
//!
//! Descriptor rule names are resolved once, at compile time, into the closed
//! [`Rule`] enum. A name the kind does not support resolves to `None` and is
//! skipped by the compiler.

mod check;
mod params;
mod registry;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::core::{format_date, BaseKind};
use crate::errors::SchemaError;
use params::Params;

pub use registry::{
    register_rule, AsyncRuleTest, CustomRule, RuleRegistry, RuleTest, SyncRuleTest, REGISTRY,
};

#[cfg(test)]
pub(crate) use registry::MockAsyncRuleTest;

/// Comparison bound for `min` / `max`.
///
/// Strings and arrays compare their length, numbers their value, dates
/// their instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    /// Numeric bound.
    Number(f64),
    /// Date bound.
    Date(DateTime<Utc>),
}

impl Limit {
    /// Renders the bound for messages.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Date(d) => format_date(d),
        }
    }
}

impl From<f64> for Limit {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Limit {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Limit {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<DateTime<Utc>> for Limit {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

/// A resolved rule.
///
/// Presence rules (`Required`, `NotRequired`, `Defined`, `Nullable`,
/// `Default`) adjust how a schema treats missing and null values; the rest
/// are tests run against present values. Every `message` overrides the
/// rule's default message template.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub enum Rule {
    /// Rejects missing and null values (and empty strings).
    Required { message: Option<String> },
    /// Undoes `Required` / `Defined`.
    NotRequired,
    /// Rejects missing values.
    Defined { message: Option<String> },
    /// Accepts null.
    Nullable,
    /// Value used when the field is missing.
    Default(Value),
    /// Lower bound.
    Min { limit: Limit, message: Option<String> },
    /// Upper bound.
    Max { limit: Limit, message: Option<String> },
    /// Exact string or array length.
    Length { length: usize, message: Option<String> },
    /// Strict upper bound.
    LessThan { limit: f64, message: Option<String> },
    /// Strict lower bound.
    MoreThan { limit: f64, message: Option<String> },
    /// Greater than zero.
    Positive { message: Option<String> },
    /// Less than zero.
    Negative { message: Option<String> },
    /// No fractional part.
    Integer { message: Option<String> },
    /// Email address shape.
    Email { message: Option<String> },
    /// Absolute URL shape.
    Url { message: Option<String> },
    /// Hyphenated UUID.
    Uuid { message: Option<String> },
    /// Regex match.
    Matches {
        pattern: Regex,
        exclude_empty: bool,
        message: Option<String>,
    },
    /// Trims whitespace; in strict mode rejects untrimmed strings.
    Trim { message: Option<String> },
    /// Lowercases; in strict mode rejects strings with uppercase letters.
    Lowercase { message: Option<String> },
    /// Uppercases; in strict mode rejects strings with lowercase letters.
    Uppercase { message: Option<String> },
    /// Value must be one of a list.
    OneOf { values: Vec<Value>, message: Option<String> },
    /// Value must not be one of a list.
    NotOneOf { values: Vec<Value>, message: Option<String> },
    /// Boolean must be `true`.
    IsTrue { message: Option<String> },
    /// Boolean must be `false`.
    IsFalse { message: Option<String> },
    /// A registered custom rule.
    Custom {
        rule: Arc<CustomRule>,
        message: Option<String>,
    },
}

const COMMON_RULES: &[&str] = &[
    "required",
    "notRequired",
    "optional",
    "defined",
    "nullable",
    "default",
    "oneOf",
    "notOneOf",
];

/// Built-in rule names a kind supports, excluding the common presence rules.
#[must_use]
pub fn builtin_rules(kind: BaseKind) -> &'static [&'static str] {
    match kind {
        BaseKind::String => &[
            "min", "max", "length", "email", "url", "uuid", "matches", "trim", "lowercase",
            "uppercase",
        ],
        BaseKind::Number => &[
            "min", "max", "lessThan", "moreThan", "positive", "negative", "integer",
        ],
        BaseKind::Array => &["min", "max", "length"],
        BaseKind::Date => &["min", "max"],
        BaseKind::Boolean => &["isTrue", "isFalse"],
        BaseKind::Object => &[],
    }
}

/// True when `kind` supports `rule_name` either as a built-in or through
/// the registry.
#[must_use]
pub fn is_supported(kind: BaseKind, rule_name: &str, registry: &RuleRegistry) -> bool {
    registry.contains(kind, rule_name)
        || COMMON_RULES.contains(&rule_name)
        || builtin_rules(kind).contains(&rule_name)
}

impl Rule {
    /// Resolves a descriptor rule for `kind`.
    ///
    /// Returns `Ok(None)` for names the kind does not support. Registered
    /// custom rules take precedence over built-ins of the same name.
    pub fn resolve(
        kind: BaseKind,
        rule_name: &str,
        params: &[Value],
        field: &str,
        registry: &RuleRegistry,
    ) -> Result<Option<Self>, SchemaError> {
        let p = Params::new(field, rule_name, params);

        if let Some(rule) = registry.get(kind, rule_name) {
            return Ok(Some(Self::Custom {
                rule,
                message: p.message(0)?,
            }));
        }

        let rule = match (kind, rule_name) {
            (_, "required") => Self::Required {
                message: p.message(0)?,
            },
            (_, "notRequired" | "optional") => Self::NotRequired,
            (_, "defined") => Self::Defined {
                message: p.message(0)?,
            },
            (_, "nullable") => Self::Nullable,
            (_, "default") => Self::Default(p.value(0)?),
            (_, "oneOf") => Self::OneOf {
                values: p.list(0)?,
                message: p.message(1)?,
            },
            (_, "notOneOf") => Self::NotOneOf {
                values: p.list(0)?,
                message: p.message(1)?,
            },
            (BaseKind::String | BaseKind::Array | BaseKind::Number, "min") => Self::Min {
                limit: Limit::Number(p.number(0)?),
                message: p.message(1)?,
            },
            (BaseKind::String | BaseKind::Array | BaseKind::Number, "max") => Self::Max {
                limit: Limit::Number(p.number(0)?),
                message: p.message(1)?,
            },
            (BaseKind::Date, "min") => Self::Min {
                limit: Limit::Date(p.date(0)?),
                message: p.message(1)?,
            },
            (BaseKind::Date, "max") => Self::Max {
                limit: Limit::Date(p.date(0)?),
                message: p.message(1)?,
            },
            (BaseKind::String | BaseKind::Array, "length") => Self::Length {
                length: p.count(0)?,
                message: p.message(1)?,
            },
            (BaseKind::Number, "lessThan") => Self::LessThan {
                limit: p.number(0)?,
                message: p.message(1)?,
            },
            (BaseKind::Number, "moreThan") => Self::MoreThan {
                limit: p.number(0)?,
                message: p.message(1)?,
            },
            (BaseKind::Number, "positive") => Self::Positive {
                message: p.message(0)?,
            },
            (BaseKind::Number, "negative") => Self::Negative {
                message: p.message(0)?,
            },
            (BaseKind::Number, "integer") => Self::Integer {
                message: p.message(0)?,
            },
            (BaseKind::String, "email") => Self::Email {
                message: p.message(0)?,
            },
            (BaseKind::String, "url") => Self::Url {
                message: p.message(0)?,
            },
            (BaseKind::String, "uuid") => Self::Uuid {
                message: p.message(0)?,
            },
            (BaseKind::String, "matches") => {
                let source = p.string(0)?;
                let pattern = Regex::new(source)
                    .map_err(|e| p.error(format!("invalid pattern '{source}': {e}")))?;
                let (message, exclude_empty) = p.match_options(1)?;
                Self::Matches {
                    pattern,
                    exclude_empty,
                    message,
                }
            }
            (BaseKind::String, "trim") => Self::Trim {
                message: p.message(0)?,
            },
            (BaseKind::String, "lowercase") => Self::Lowercase {
                message: p.message(0)?,
            },
            (BaseKind::String, "uppercase") => Self::Uppercase {
                message: p.message(0)?,
            },
            (BaseKind::Boolean, "isTrue") => Self::IsTrue {
                message: p.message(0)?,
            },
            (BaseKind::Boolean, "isFalse") => Self::IsFalse {
                message: p.message(0)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(rule))
    }

    /// The failure kind this rule reports.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Required { .. } => "required",
            Self::NotRequired => "notRequired",
            Self::Defined { .. } => "defined",
            Self::Nullable => "nullable",
            Self::Default(_) => "default",
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Length { .. } => "length",
            Self::LessThan { .. } => "lessThan",
            Self::MoreThan { .. } => "moreThan",
            Self::Positive { .. } => "positive",
            Self::Negative { .. } => "negative",
            Self::Integer { .. } => "integer",
            Self::Email { .. } => "email",
            Self::Url { .. } => "url",
            Self::Uuid { .. } => "uuid",
            Self::Matches { .. } => "matches",
            Self::Trim { .. } => "trim",
            Self::Lowercase { .. } => "lowercase",
            Self::Uppercase { .. } => "uppercase",
            Self::OneOf { .. } => "oneOf",
            Self::NotOneOf { .. } => "notOneOf",
            Self::IsTrue { .. } => "isTrue",
            Self::IsFalse { .. } => "isFalse",
            Self::Custom { rule, .. } => rule.test_name(),
        }
    }

    /// True for rules that shape presence handling rather than test values.
    #[must_use]
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            Self::Required { .. }
                | Self::NotRequired
                | Self::Defined { .. }
                | Self::Nullable
                | Self::Default(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(kind: BaseKind, name: &str, params: &[Value]) -> Option<Rule> {
        Rule::resolve(kind, name, params, "field", &RuleRegistry::new()).unwrap()
    }

    #[test]
    fn test_resolve_common_rules_for_every_kind() {
        for kind in BaseKind::ALL {
            assert!(matches!(
                resolve(kind, "required", &[json!("msg")]),
                Some(Rule::Required { message: Some(_) })
            ));
            assert!(matches!(resolve(kind, "nullable", &[]), Some(Rule::Nullable)));
            assert!(matches!(resolve(kind, "optional", &[]), Some(Rule::NotRequired)));
        }
    }

    #[test]
    fn test_resolve_kind_specific_rules() {
        assert!(matches!(
            resolve(BaseKind::String, "min", &[json!(5), json!("too short")]),
            Some(Rule::Min { limit: Limit::Number(n), message: Some(_) }) if n == 5.0
        ));
        assert!(matches!(
            resolve(BaseKind::Date, "max", &[json!("2030-01-01")]),
            Some(Rule::Max { limit: Limit::Date(_), message: None })
        ));
        assert!(matches!(
            resolve(BaseKind::Boolean, "isTrue", &[]),
            Some(Rule::IsTrue { .. })
        ));
    }

    #[test]
    fn test_resolve_unsupported_names() {
        assert!(resolve(BaseKind::Number, "email", &[]).is_none());
        assert!(resolve(BaseKind::Boolean, "min", &[json!(1)]).is_none());
        assert!(resolve(BaseKind::Object, "shape", &[]).is_none());
        assert!(resolve(BaseKind::String, "customValidation", &[]).is_none());
    }

    #[test]
    fn test_resolve_invalid_params() {
        let registry = RuleRegistry::new();
        let err = Rule::resolve(BaseKind::Number, "min", &[json!("five")], "total", &registry)
            .unwrap_err();
        assert!(err.to_string().contains("'min' on field 'total'"));

        let err = Rule::resolve(BaseKind::String, "matches", &[json!("(")], "code", &registry)
            .unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_resolve_prefers_registered_rule() {
        let registry = RuleRegistry::new();
        registry.register(
            CustomRule::new(BaseKind::String, "email", "${path} is not ours", |_| true)
                .with_test_name("corporateEmail"),
        );

        let rule = Rule::resolve(BaseKind::String, "email", &[], "email", &registry)
            .unwrap()
            .unwrap();
        assert_eq!(rule.name(), "corporateEmail");
    }

    #[test]
    fn test_is_supported() {
        let registry = RuleRegistry::new();
        registry.register(CustomRule::new(BaseKind::Number, "even", "odd", |_| true));

        assert!(is_supported(BaseKind::Number, "even", &registry));
        assert!(is_supported(BaseKind::Array, "min", &registry));
        assert!(is_supported(BaseKind::Object, "default", &registry));
        assert!(!is_supported(BaseKind::String, "even", &registry));
        assert!(!is_supported(BaseKind::Date, "length", &registry));
    }

    #[test]
    fn test_limit_display() {
        assert_eq!(Limit::from(5).display(), "5");
        assert_eq!(Limit::from(2.5).display(), "2.5");
    }
}
