//! Message templates and field paths.

use serde_json::Value;

/// Placeholder used in messages when a value has no path.
pub const ROOT_LABEL: &str = "this";

/// Replaces `${key}` placeholders in a message template.
///
/// `${path}` is always available; unknown placeholders are left untouched.
#[must_use]
pub fn interpolate(template: &str, path: &str, params: &[(&str, String)]) -> String {
    if !template.contains("${") {
        return template.to_string();
    }
    let label = if path.is_empty() { ROOT_LABEL } else { path };
    let mut message = template.replace("${path}", label);
    for (key, value) in params {
        message = message.replace(&format!("${{{key}}}"), value);
    }
    message
}

/// Joins an object key onto a parent path.
#[must_use]
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Joins an array index onto a parent path.
#[must_use]
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Renders a value the way it appears inside messages.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a list of values for `oneOf` style messages.
#[must_use]
pub fn display_list(values: &[Value]) -> String {
    values
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpolate_path_and_params() {
        let message = interpolate(
            "${path} must be at least ${min} characters",
            "name",
            &[("min", "5".to_string())],
        );
        assert_eq!(message, "name must be at least 5 characters");
    }

    #[test]
    fn test_interpolate_root_path() {
        assert_eq!(interpolate("${path} is invalid", "", &[]), "this is invalid");
    }

    #[test]
    fn test_interpolate_plain_message() {
        assert_eq!(
            interpolate("custom cannot be less than 10", "custom", &[]),
            "custom cannot be less than 10"
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(child_path("", "metadata"), "metadata");
        assert_eq!(child_path("metadata", "variants"), "metadata.variants");
        assert_eq!(
            child_path(&index_path("metadata.variants", 0), "color"),
            "metadata.variants[0].color"
        );
    }

    #[test]
    fn test_display_list() {
        assert_eq!(display_list(&[json!("a"), json!(1), json!(null)]), "a, 1, null");
    }
}
