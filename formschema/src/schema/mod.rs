//! Typed field schemas.
//!
//! A [`Schema`] is what a descriptor compiles into: a base kind, presence
//! handling, and an ordered list of tests. The builder methods mirror the
//! descriptor rule names and are how overrides express shapes descriptors
//! cannot (objects with fields, arrays of elements).
//!
//! ```rust,ignore
//! let variants = Schema::array()
//!     .of(Schema::object().shape([
//!         ("color", Schema::string().required(Some("Please specify Color"))),
//!         ("size", Schema::number().required(Some("Please specify Size"))),
//!     ]))
//!     .required(None)
//!     .min(1, None);
//! ```

pub(crate) mod engine;

pub use engine::Record;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::BaseKind;
use crate::rules::{CustomRule, Limit, Rule};

/// How a schema treats missing and null values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Presence {
    /// Missing values pass.
    #[default]
    Optional,
    /// Missing values fail; null follows the nullable flag.
    Defined(Option<String>),
    /// Missing, null, and (for strings) empty values fail.
    Required(Option<String>),
}

/// A compiled validator for one value.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: BaseKind,
    presence: Presence,
    nullable: bool,
    default: Option<Value>,
    tests: Vec<Rule>,
    fields: Vec<(String, Schema)>,
    element: Option<Box<Schema>>,
}

impl Schema {
    /// Creates a pass-through schema for `kind`.
    #[must_use]
    pub fn new(kind: BaseKind) -> Self {
        Self {
            kind,
            presence: Presence::Optional,
            nullable: false,
            default: None,
            tests: Vec::new(),
            fields: Vec::new(),
            element: None,
        }
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::new(BaseKind::String)
    }

    /// A number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::new(BaseKind::Number)
    }

    /// An array schema.
    #[must_use]
    pub fn array() -> Self {
        Self::new(BaseKind::Array)
    }

    /// An object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::new(BaseKind::Object)
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(BaseKind::Boolean)
    }

    /// A date schema.
    #[must_use]
    pub fn date() -> Self {
        Self::new(BaseKind::Date)
    }

    /// Applies a resolved rule, returning the refined schema.
    #[must_use]
    pub fn apply(mut self, rule: Rule) -> Self {
        match rule {
            Rule::Required { message } => self.presence = Presence::Required(message),
            Rule::NotRequired => self.presence = Presence::Optional,
            Rule::Defined { message } => self.presence = Presence::Defined(message),
            Rule::Nullable => self.nullable = true,
            Rule::Default(value) => self.default = Some(value),
            test => self.tests.push(test),
        }
        self
    }

    /// Marks the value as required.
    #[must_use]
    pub fn required(self, message: Option<&str>) -> Self {
        self.apply(Rule::Required {
            message: message.map(String::from),
        })
    }

    /// Marks the value as optional again.
    #[must_use]
    pub fn not_required(self) -> Self {
        self.apply(Rule::NotRequired)
    }

    /// Rejects missing values but not null ones.
    #[must_use]
    pub fn defined(self, message: Option<&str>) -> Self {
        self.apply(Rule::Defined {
            message: message.map(String::from),
        })
    }

    /// Accepts null.
    #[must_use]
    pub fn nullable(self) -> Self {
        self.apply(Rule::Nullable)
    }

    /// Value used when the field is missing.
    #[must_use]
    pub fn default_value(self, value: Value) -> Self {
        self.apply(Rule::Default(value))
    }

    /// Lower bound on length (strings, arrays), value (numbers), or instant (dates).
    #[must_use]
    pub fn min(self, limit: impl Into<Limit>, message: Option<&str>) -> Self {
        self.apply(Rule::Min {
            limit: limit.into(),
            message: message.map(String::from),
        })
    }

    /// Upper bound on length (strings, arrays), value (numbers), or instant (dates).
    #[must_use]
    pub fn max(self, limit: impl Into<Limit>, message: Option<&str>) -> Self {
        self.apply(Rule::Max {
            limit: limit.into(),
            message: message.map(String::from),
        })
    }

    /// Exact length.
    #[must_use]
    pub fn length(self, length: usize, message: Option<&str>) -> Self {
        self.apply(Rule::Length {
            length,
            message: message.map(String::from),
        })
    }

    /// Email address.
    #[must_use]
    pub fn email(self, message: Option<&str>) -> Self {
        self.apply(Rule::Email {
            message: message.map(String::from),
        })
    }

    /// Absolute URL.
    #[must_use]
    pub fn url(self, message: Option<&str>) -> Self {
        self.apply(Rule::Url {
            message: message.map(String::from),
        })
    }

    /// Hyphenated UUID.
    #[must_use]
    pub fn uuid(self, message: Option<&str>) -> Self {
        self.apply(Rule::Uuid {
            message: message.map(String::from),
        })
    }

    /// Regex match.
    #[must_use]
    pub fn matches(self, pattern: Regex, message: Option<&str>) -> Self {
        self.apply(Rule::Matches {
            pattern,
            exclude_empty: false,
            message: message.map(String::from),
        })
    }

    /// Trims surrounding whitespace.
    #[must_use]
    pub fn trim(self) -> Self {
        self.apply(Rule::Trim { message: None })
    }

    /// Lowercases the value.
    #[must_use]
    pub fn lowercase(self) -> Self {
        self.apply(Rule::Lowercase { message: None })
    }

    /// Uppercases the value.
    #[must_use]
    pub fn uppercase(self) -> Self {
        self.apply(Rule::Uppercase { message: None })
    }

    /// Strictly below `limit`.
    #[must_use]
    pub fn less_than(self, limit: f64, message: Option<&str>) -> Self {
        self.apply(Rule::LessThan {
            limit,
            message: message.map(String::from),
        })
    }

    /// Strictly above `limit`.
    #[must_use]
    pub fn more_than(self, limit: f64, message: Option<&str>) -> Self {
        self.apply(Rule::MoreThan {
            limit,
            message: message.map(String::from),
        })
    }

    /// Greater than zero.
    #[must_use]
    pub fn positive(self, message: Option<&str>) -> Self {
        self.apply(Rule::Positive {
            message: message.map(String::from),
        })
    }

    /// Less than zero.
    #[must_use]
    pub fn negative(self, message: Option<&str>) -> Self {
        self.apply(Rule::Negative {
            message: message.map(String::from),
        })
    }

    /// Whole numbers only.
    #[must_use]
    pub fn integer(self, message: Option<&str>) -> Self {
        self.apply(Rule::Integer {
            message: message.map(String::from),
        })
    }

    /// Value must be one of `values`.
    #[must_use]
    pub fn one_of(self, values: Vec<Value>, message: Option<&str>) -> Self {
        self.apply(Rule::OneOf {
            values,
            message: message.map(String::from),
        })
    }

    /// Value must not be one of `values`.
    #[must_use]
    pub fn not_one_of(self, values: Vec<Value>, message: Option<&str>) -> Self {
        self.apply(Rule::NotOneOf {
            values,
            message: message.map(String::from),
        })
    }

    /// Boolean must be `true`.
    #[must_use]
    pub fn is_true(self, message: Option<&str>) -> Self {
        self.apply(Rule::IsTrue {
            message: message.map(String::from),
        })
    }

    /// Boolean must be `false`.
    #[must_use]
    pub fn is_false(self, message: Option<&str>) -> Self {
        self.apply(Rule::IsFalse {
            message: message.map(String::from),
        })
    }

    /// Adds a custom rule test.
    #[must_use]
    pub fn custom(self, rule: Arc<CustomRule>, message: Option<&str>) -> Self {
        self.apply(Rule::Custom {
            rule,
            message: message.map(String::from),
        })
    }

    /// Sets the fields of an object schema. Ignored for other kinds.
    #[must_use]
    pub fn shape<K, I>(mut self, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        self.fields = fields.into_iter().map(|(k, s)| (k.into(), s)).collect();
        self
    }

    /// Sets the element schema of an array schema. Ignored for other kinds.
    #[must_use]
    pub fn of(mut self, element: Schema) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    /// The base kind.
    #[must_use]
    pub fn kind(&self) -> BaseKind {
        self.kind
    }

    /// Presence handling.
    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// True when missing or null values fail.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required(_))
    }

    /// True when null is accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The default for missing values.
    #[must_use]
    pub fn fallback_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Tests in application order.
    #[must_use]
    pub fn tests(&self) -> &[Rule] {
        &self.tests
    }

    /// Object fields.
    #[must_use]
    pub fn fields(&self) -> &[(String, Schema)] {
        if self.kind == BaseKind::Object {
            &self.fields
        } else {
            &[]
        }
    }

    /// Array element schema.
    #[must_use]
    pub fn element(&self) -> Option<&Schema> {
        if self.kind == BaseKind::Array {
            self.element.as_deref()
        } else {
            None
        }
    }

    /// True when any test, here or nested, must be awaited.
    #[must_use]
    pub fn has_async_tests(&self) -> bool {
        self.tests
            .iter()
            .any(|t| matches!(t, Rule::Custom { rule, .. } if rule.is_async()))
            || self.fields().iter().any(|(_, s)| s.has_async_tests())
            || self.element().is_some_and(Schema::has_async_tests)
    }

    /// A serializable summary of the schema.
    #[must_use]
    pub fn describe(&self) -> SchemaDescription {
        SchemaDescription {
            kind: self.kind,
            required: self.is_required(),
            nullable: self.nullable,
            default: self.default.clone(),
            tests: self.tests.iter().map(|t| t.name().to_string()).collect(),
            fields: self
                .fields()
                .iter()
                .map(|(k, s)| (k.clone(), s.describe()))
                .collect(),
            element: self.element().map(|e| Box::new(e.describe())),
        }
    }
}

/// Serializable summary of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescription {
    /// Base kind.
    #[serde(rename = "type")]
    pub kind: BaseKind,
    /// Whether the value is required.
    pub required: bool,
    /// Whether null is accepted.
    pub nullable: bool,
    /// Default for missing values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Test names in order.
    pub tests: Vec<String>,
    /// Object fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<(String, SchemaDescription)>,
    /// Array element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<SchemaDescription>>,
}
