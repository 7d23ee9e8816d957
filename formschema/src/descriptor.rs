//! Field descriptor tables.
//!
//! A descriptor table is the declarative input of the compiler: an ordered
//! list of fields, each naming a base kind and a list of rules with
//! positional parameters. Presentation keys (`label`, `placeholder`, `type`,
//! `value`, ...) ride along untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::errors::SchemaError;

/// One named rule with its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule name (`required`, `min`, `customValidation`, ...).
    #[serde(rename = "type")]
    pub rule_name: String,
    /// Positional arguments; the last one is conventionally the message.
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl RuleSpec {
    /// Creates a rule spec.
    #[must_use]
    pub fn new(rule_name: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self {
            rule_name: rule_name.into(),
            params,
        }
    }
}

/// Declarative description of one validated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Output field name.
    pub id: String,
    /// Base kind name; unknown names make the compiler skip the field.
    pub validation_type: String,
    /// Ordered rules.
    #[serde(default)]
    pub validations: Vec<RuleSpec>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Input placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Initial input value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Other presentation metadata.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldDescriptor {
    /// Creates a descriptor with no rules.
    #[must_use]
    pub fn new(id: impl Into<String>, validation_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            validation_type: validation_type.into(),
            validations: Vec::new(),
            label: None,
            placeholder: None,
            value: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule_name: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        self.validations.push(RuleSpec::new(rule_name, params));
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// An ordered list of field descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorTable {
    fields: Vec<FieldDescriptor>,
}

impl DescriptorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a table from a JSON array.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a table from a reader yielding a JSON array.
    pub fn from_reader(reader: impl Read) -> Result<Self, SchemaError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Appends a descriptor.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a descriptor in place.
    pub fn push(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    /// Returns the descriptors in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a descriptor by id (first match).
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Ids that appear more than once, in first-repeat order.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for field in &self.fields {
            if !seen.insert(field.id.as_str()) && !duplicates.contains(&field.id.as_str()) {
                duplicates.push(field.id.as_str());
            }
        }
        duplicates
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the table has no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Vec<FieldDescriptor>> for DescriptorTable {
    fn from(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }
}

impl AsRef<[FieldDescriptor]> for DescriptorTable {
    fn as_ref(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    const TABLE: &str = r#"[
        {
            "id": "name",
            "label": "Full name",
            "placeholder": "Enter full name",
            "type": "text",
            "validationType": "string",
            "value": "User name",
            "validations": [
                {"type": "required", "params": ["this field is required"]},
                {"type": "min", "params": [5, "name cannot be less than 5 characters"]}
            ]
        },
        {
            "id": "total",
            "validationType": "number",
            "required": false
        }
    ]"#;

    #[test]
    fn test_parse_table() {
        let table = DescriptorTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.len(), 2);

        let name = table.get("name").unwrap();
        assert_eq!(name.validation_type, "string");
        assert_eq!(name.label.as_deref(), Some("Full name"));
        assert_eq!(name.validations.len(), 2);
        assert_eq!(name.validations[1].rule_name, "min");
        assert_eq!(name.validations[1].params[0], json!(5));
        assert_eq!(name.extra.get("type"), Some(&json!("text")));

        let total = table.get("total").unwrap();
        assert!(total.validations.is_empty());
        assert_eq!(total.extra.get("required"), Some(&json!(false)));
    }

    #[test]
    fn test_rule_spec_without_params() {
        let spec: RuleSpec = serde_json::from_value(json!({"type": "email"})).unwrap();
        assert_eq!(spec, RuleSpec::new("email", vec![]));
    }

    #[test]
    fn test_round_trip_keeps_presentation_keys() {
        let table = DescriptorTable::from_json_str(TABLE).unwrap();
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value[0]["type"], json!("text"));
        assert_eq!(value[0]["validationType"], json!("string"));
        assert_eq!(value[0]["validations"][0]["type"], json!("required"));
    }

    #[test]
    fn test_invalid_table() {
        let err = DescriptorTable::from_json_str(r#"[{"validationType": "string"}]"#).unwrap_err();
        assert!(matches!(err, SchemaError::Serialization(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let table = DescriptorTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let missing = DescriptorTable::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(SchemaError::Io(_))));
    }

    #[test]
    fn test_duplicate_ids() {
        let table = DescriptorTable::new()
            .with_field(FieldDescriptor::new("a", "string"))
            .with_field(FieldDescriptor::new("b", "number"))
            .with_field(FieldDescriptor::new("a", "number"))
            .with_field(FieldDescriptor::new("a", "date"));
        assert_eq!(table.duplicate_ids(), vec!["a"]);
    }

    #[test]
    fn test_builder() {
        let field = FieldDescriptor::new("email", "string")
            .with_label("Email")
            .with_placeholder("Email")
            .with_value(json!("email"))
            .with_rule("email", vec![json!("please enter a valid email")]);
        assert_eq!(field.validations.len(), 1);
        assert_eq!(field.placeholder.as_deref(), Some("Email"));
    }
}
