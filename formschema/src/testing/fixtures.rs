//! Sample data mirroring a typical sign-up form.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::compiler::SchemaCompiler;
use crate::composite::CompositeValidator;
use crate::core::BaseKind;
use crate::descriptor::{DescriptorTable, FieldDescriptor};
use crate::errors::SchemaError;
use crate::rules::{CustomRule, RuleRegistry};
use crate::schema::{Record, Schema};

/// Rule name descriptors use for [`min_ten_rule`].
pub const MIN_TEN_RULE: &str = "customValidation";

/// Failure kind reported by [`min_ten_rule`].
pub const MIN_TEN_TEST: &str = "custom";

/// The sample descriptor table: `name`, `email`, `phoneNumber`, `total`,
/// `values`, and `custom`.
#[must_use]
pub fn sample_table() -> DescriptorTable {
    DescriptorTable::new()
        .with_field(
            FieldDescriptor::new("name", "string")
                .with_label("Full name")
                .with_placeholder("Enter full name")
                .with_value(json!("User name"))
                .with_rule("required", vec![json!("this field is required")])
                .with_rule("min", vec![json!(5), json!("name cannot be less than 5 characters")])
                .with_rule("max", vec![json!(10), json!("name cannot be more than 10 characters")]),
        )
        .with_field(
            FieldDescriptor::new("email", "string")
                .with_label("Email")
                .with_placeholder("Email")
                .with_value(json!("email"))
                .with_rule("required", vec![json!("this field is required")])
                .with_rule("min", vec![json!(5), json!("email cannot be less than 5 characters")])
                .with_rule("max", vec![json!(10), json!("email cannot be more than 10 characters")])
                .with_rule("email", vec![json!("please enter a valid email")]),
        )
        .with_field(
            FieldDescriptor::new("phoneNumber", "number")
                .with_label("phone number")
                .with_value(json!(7_878_787_878_u64))
                .with_rule(
                    "min",
                    vec![json!(5), json!("phone number cannot be less than 5 characters")],
                )
                .with_rule(
                    "max",
                    vec![json!(10), json!("phone number cannot be more than 10 characters")],
                )
                .with_rule("required", vec![json!("phone number is required")]),
        )
        .with_field(
            FieldDescriptor::new("total", "number")
                .with_label("Total People in Family")
                .with_placeholder("family members count")
                .with_value(json!("1"))
                .with_rule("required", vec![json!("this field is required")])
                .with_rule("min", vec![json!(1), json!("there should be atleast 1 family member")])
                .with_rule("max", vec![json!(5), json!("max family members can be 5")]),
        )
        .with_field(
            FieldDescriptor::new("values", "array")
                .with_label("Values")
                .with_value(json!([]))
                .with_rule("min", vec![json!(1), json!("array should have min one item")])
                .with_rule("required", vec![json!("values is required")]),
        )
        .with_field(
            FieldDescriptor::new("custom", "number")
                .with_label("Custom")
                .with_value(json!(7_878_787_878_u64))
                .with_rule(MIN_TEN_RULE, vec![json!("custom cannot be less than 10")]),
        )
}

/// Number rule passing values of at least 10.
///
/// Missing and null values fail it too, since the test sees `null`.
#[must_use]
pub fn min_ten_rule() -> CustomRule {
    CustomRule::new(
        BaseKind::Number,
        MIN_TEN_RULE,
        "${path} cannot be less than 10",
        |value| value.as_f64().is_some_and(|n| n >= 10.0),
    )
    .with_test_name(MIN_TEN_TEST)
}

/// A fresh registry holding [`min_ten_rule`].
#[must_use]
pub fn sample_registry() -> Arc<RuleRegistry> {
    let registry = Arc::new(RuleRegistry::new());
    registry.register(min_ten_rule());
    registry
}

/// Hand-written overrides adding a nested `metadata` object.
#[must_use]
pub fn sample_overrides() -> CompositeValidator {
    let variant = Schema::object().shape([
        ("color", Schema::string().required(Some("Please specify Color"))),
        ("size", Schema::number().required(Some("Please specify Size"))),
    ]);
    let metadata = Schema::object().shape([(
        "variants",
        Schema::array().of(variant).required(None).min(1, None),
    )]);
    CompositeValidator::new().with_field("metadata", metadata)
}

/// The sample table compiled against [`sample_registry`] and merged with
/// [`sample_overrides`].
pub fn sample_validator() -> Result<CompositeValidator, SchemaError> {
    let compiled = SchemaCompiler::new(sample_registry()).compile(sample_table())?;
    Ok(compiled.merge_overrides(&sample_overrides()))
}

/// A record that passes [`sample_validator`].
#[must_use]
pub fn sample_record() -> Record {
    record(json!({
        "name": "names",
        "email": "s@b.com",
        "phoneNumber": 6,
        "total": "4",
        "values": [{}],
        "metadata": {
            "variants": [{"color": "a", "size": 100}]
        },
        "custom": 10
    }))
}

/// Converts a JSON object into a record. Non-objects give an empty record.
#[must_use]
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// [`sample_record`] with `key` set to `value`.
#[must_use]
pub fn sample_record_with(key: &str, value: Value) -> Record {
    let mut record = sample_record();
    record.insert(key.to_string(), value);
    record
}
