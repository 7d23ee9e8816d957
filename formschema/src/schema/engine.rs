//! The validation engine.
//!
//! One recursive walk serves both run modes. In [`ExecMode::Sync`] the walk
//! never suspends, so callers drive it with `now_or_never`; a custom rule
//! that must be awaited is a fatal error there instead.

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Presence, Schema};
use crate::config::ValidateOptions;
use crate::core::{cast_value, child_path, display_value, index_path, interpolate, type_error, BaseKind};
use crate::errors::{SchemaError, ValidationFailure};
use crate::rules::{CustomRule, Rule, RuleTest};

/// A validated record.
pub type Record = Map<String, Value>;

/// Whether custom async tests may be awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecMode {
    Sync,
    Async,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunContext<'a> {
    pub options: &'a ValidateOptions,
    pub mode: ExecMode,
}

/// Output of one step of the walk.
#[derive(Debug)]
pub(crate) struct Checked<T> {
    pub value: T,
    pub failures: Vec<ValidationFailure>,
}

/// Validates every schema field against `record`.
///
/// The outer error is fatal; the inner one carries the raw failure, an
/// aggregate in collect-all mode.
pub(crate) async fn run_record(
    fields: &[(String, Schema)],
    record: &Record,
    options: &ValidateOptions,
    mode: ExecMode,
) -> Result<Result<Record, ValidationFailure>, SchemaError> {
    let ctx = RunContext { options, mode };
    let checked = check_shape(fields, record.clone(), String::new(), ctx).await?;
    Ok(match finish(checked.failures, options) {
        Some(failure) => Err(failure),
        None => Ok(checked.value),
    })
}

fn finish(
    mut failures: Vec<ValidationFailure>,
    options: &ValidateOptions,
) -> Option<ValidationFailure> {
    if failures.is_empty() {
        None
    } else if options.collect_all {
        Some(ValidationFailure::aggregate(failures))
    } else {
        Some(failures.swap_remove(0))
    }
}

pub(crate) fn check_shape<'a>(
    fields: &'a [(String, Schema)],
    mut record: Record,
    path: String,
    ctx: RunContext<'a>,
) -> BoxFuture<'a, Result<Checked<Record>, SchemaError>> {
    async move {
        let mut output = if ctx.options.strip_unknown {
            Map::new()
        } else {
            record.clone()
        };
        let mut failures = Vec::new();

        for (key, schema) in fields {
            let checked =
                check_value(schema, record.remove(key), child_path(&path, key), ctx).await?;
            match checked.value {
                Some(value) => {
                    output.insert(key.clone(), value);
                }
                None => {
                    output.remove(key);
                }
            }
            let failed = !checked.failures.is_empty();
            failures.extend(checked.failures);
            if failed && ctx.options.abort_early() {
                break;
            }
        }

        Ok(Checked {
            value: output,
            failures,
        })
    }
    .boxed()
}

fn check_elements<'a>(
    element: &'a Schema,
    items: Vec<Value>,
    path: String,
    ctx: RunContext<'a>,
) -> BoxFuture<'a, Result<Checked<Vec<Value>>, SchemaError>> {
    async move {
        let mut output = Vec::with_capacity(items.len());
        let mut failures = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let checked = check_value(element, Some(item), index_path(&path, index), ctx).await?;
            output.push(checked.value.unwrap_or(Value::Null));
            let failed = !checked.failures.is_empty();
            failures.extend(checked.failures);
            if failed && ctx.options.abort_early() {
                break;
            }
        }

        Ok(Checked {
            value: output,
            failures,
        })
    }
    .boxed()
}

/// Validates one value. `None` means the key was missing.
pub(crate) fn check_value<'a>(
    schema: &'a Schema,
    input: Option<Value>,
    path: String,
    ctx: RunContext<'a>,
) -> BoxFuture<'a, Result<Checked<Option<Value>>, SchemaError>> {
    async move {
        let raw = input.or_else(|| schema.fallback_value().cloned());
        let mut failures = Vec::new();

        let present = match &raw {
            None | Some(Value::Null) => None,
            Some(value) => match cast_value(schema.kind(), value, ctx.options.strict) {
                Some(cast) if ctx.options.strict => Some(cast),
                Some(cast) => Some(schema.tests().iter().fold(cast, |v, rule| rule.transform(v))),
                None => {
                    failures.push(type_error(schema.kind(), &path, value));
                    return Ok(Checked {
                        value: raw.clone(),
                        failures,
                    });
                }
            },
        };

        if let Some(failure) = presence_failure(schema, raw.as_ref(), present.as_ref(), &path) {
            failures.push(failure);
            if ctx.options.abort_early() {
                return Ok(Checked {
                    value: present.or(raw),
                    failures,
                });
            }
        }

        let subject = present.clone().unwrap_or(Value::Null);
        for rule in schema.tests() {
            let failure = match rule {
                Rule::Custom { rule, message } => {
                    if present.is_none() && rule.skips_absent() {
                        continue;
                    }
                    run_custom(rule, message.as_deref(), &subject, &path, ctx).await?
                }
                builtin => {
                    if present.is_none() {
                        continue;
                    }
                    builtin.check(schema.kind(), &subject, &path)
                }
            };
            if let Some(failure) = failure {
                failures.push(failure);
                if ctx.options.abort_early() {
                    return Ok(Checked {
                        value: present.or(raw),
                        failures,
                    });
                }
            }
        }

        let value = match (present, schema.element()) {
            (Some(Value::Object(map)), _) if !schema.fields().is_empty() => {
                let checked = check_shape(schema.fields(), map, path, ctx).await?;
                failures.extend(checked.failures);
                Some(Value::Object(checked.value))
            }
            (Some(Value::Array(items)), Some(element)) => {
                let checked = check_elements(element, items, path, ctx).await?;
                failures.extend(checked.failures);
                Some(Value::Array(checked.value))
            }
            (Some(value), _) => Some(value),
            (None, _) => raw,
        };

        Ok(Checked { value, failures })
    }
    .boxed()
}

/// Failure from presence handling, if any.
///
/// `raw` is the input after defaulting; `present` is the cast value, `None`
/// for missing and null input.
fn presence_failure(
    schema: &Schema,
    raw: Option<&Value>,
    present: Option<&Value>,
    path: &str,
) -> Option<ValidationFailure> {
    let failure = |kind: &str, custom: Option<&String>, template: &str| {
        let message = interpolate(custom.map_or(template, String::as_str), path, &[]);
        ValidationFailure::new(path, kind, message).with_value(raw.cloned().unwrap_or(Value::Null))
    };

    match (raw, schema.presence()) {
        (None | Some(Value::Null), Presence::Required(message)) => Some(failure(
            "required",
            message.as_ref(),
            "${path} is a required field",
        )),
        (None, Presence::Defined(message)) => Some(failure(
            "defined",
            message.as_ref(),
            "${path} must be defined",
        )),
        (None, Presence::Optional) => None,
        (Some(Value::Null), _) if !schema.is_nullable() => {
            Some(failure("nullable", None, "${path} cannot be null"))
        }
        (_, Presence::Required(message))
            if schema.kind() == BaseKind::String && present.and_then(Value::as_str) == Some("") =>
        {
            Some(failure(
                "required",
                message.as_ref(),
                "${path} is a required field",
            ))
        }
        _ => None,
    }
}

async fn run_custom(
    rule: &CustomRule,
    message: Option<&str>,
    value: &Value,
    path: &str,
    ctx: RunContext<'_>,
) -> Result<Option<ValidationFailure>, SchemaError> {
    debug!(rule = rule.rule_name(), path, "Running custom rule");

    let passed = match rule.test() {
        RuleTest::Sync(test) => test(value),
        RuleTest::Async(test) => match ctx.mode {
            ExecMode::Async => test.test(value).await,
            ExecMode::Sync => {
                return Err(SchemaError::AsyncRuleInSyncRun {
                    rule: rule.rule_name().to_string(),
                })
            }
        },
    };
    if passed {
        return Ok(None);
    }

    let template = message.unwrap_or_else(|| rule.default_message());
    let message = interpolate(template, path, &[("value", display_value(value))]);
    Ok(Some(
        ValidationFailure::new(path, rule.test_name(), message).with_value(value.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MockAsyncRuleTest;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn check(schema: &Schema, input: Option<Value>, options: &ValidateOptions) -> Checked<Option<Value>> {
        let ctx = RunContext {
            options,
            mode: ExecMode::Sync,
        };
        check_value(schema, input, "field".to_string(), ctx)
            .now_or_never()
            .unwrap()
            .unwrap()
    }

    fn kinds(checked: &Checked<Option<Value>>) -> Vec<&str> {
        checked.failures.iter().map(|f| f.kind.as_str()).collect()
    }

    #[test]
    fn test_missing_optional_value_passes() {
        let checked = check(&Schema::string().min(3, None), None, &ValidateOptions::new());
        assert!(checked.failures.is_empty());
        assert_eq!(checked.value, None);
    }

    #[test]
    fn test_missing_value_uses_default() {
        let schema = Schema::number().default_value(json!(7)).min(10, None);
        let checked = check(&schema, None, &ValidateOptions::collect_all());
        assert_eq!(kinds(&checked), vec!["min"]);
        assert_eq!(checked.value, Some(json!(7)));
    }

    #[test]
    fn test_required_and_defined() {
        let options = ValidateOptions::collect_all();
        let required = Schema::string().required(None);
        let checked = check(&required, None, &options);
        assert_eq!(kinds(&checked), vec!["required"]);
        assert_eq!(checked.failures[0].message, "field is a required field");

        let checked = check(&Schema::string().defined(None), Some(Value::Null), &options);
        assert_eq!(kinds(&checked), vec!["nullable"]);
        assert_eq!(checked.failures[0].message, "field cannot be null");

        let checked = check(&Schema::string().nullable(), Some(Value::Null), &options);
        assert!(checked.failures.is_empty());
        assert_eq!(checked.value, Some(Value::Null));
    }

    #[test]
    fn test_empty_string_fails_required_then_min() {
        let schema = Schema::string()
            .required(Some("this field is required"))
            .min(5, None);
        let checked = check(&schema, Some(json!("")), &ValidateOptions::collect_all());
        assert_eq!(kinds(&checked), vec!["required", "min"]);
        assert_eq!(checked.failures[0].message, "this field is required");

        let checked = check(&schema, Some(json!("")), &ValidateOptions::new());
        assert_eq!(kinds(&checked), vec!["required"]);
    }

    #[test]
    fn test_cast_failure_stops_tests() {
        let schema = Schema::number().required(None).min(1, None);
        let checked = check(&schema, Some(json!("abc")), &ValidateOptions::collect_all());
        assert_eq!(kinds(&checked), vec!["typeError"]);
        assert_eq!(checked.value, Some(json!("abc")));
    }

    #[test]
    fn test_cast_value_is_returned() {
        let checked = check(&Schema::number(), Some(json!("4")), &ValidateOptions::new());
        assert_eq!(checked.value, Some(json!(4)));
    }

    #[test]
    fn test_transforms_depend_on_strict() {
        let schema = Schema::string().trim().lowercase();
        let checked = check(&schema, Some(json!("  MiXed ")), &ValidateOptions::new());
        assert!(checked.failures.is_empty());
        assert_eq!(checked.value, Some(json!("mixed")));

        let strict = ValidateOptions::collect_all().with_strict(true);
        let checked = check(&schema, Some(json!("  MiXed ")), &strict);
        assert_eq!(kinds(&checked), vec!["trim", "lowercase"]);
    }

    #[test]
    fn test_nested_paths() {
        let schema = Schema::object().shape([(
            "variants",
            Schema::array().of(Schema::object().shape([(
                "color",
                Schema::string().required(Some("Please specify Color")),
            )])),
        )]);
        let input = json!({"variants": [{"color": "red"}, {"color": ""}]});
        let checked = check(&schema, Some(input), &ValidateOptions::collect_all());

        assert_eq!(checked.failures.len(), 1);
        assert_eq!(checked.failures[0].path, "field.variants[1].color");
        assert_eq!(checked.failures[0].message, "Please specify Color");
    }

    #[test]
    fn test_custom_rule_runs_on_absent_value() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let rule = Arc::new(CustomRule::new(BaseKind::Number, "seen", "${path} unseen", move |v| {
            recorder.lock().push(v.clone());
            true
        }));
        check(&Schema::number().custom(rule, None), None, &ValidateOptions::new());
        assert_eq!(*seen.lock(), vec![Value::Null]);

        let skipping = Arc::new(
            CustomRule::new(BaseKind::Number, "never", "${path} never", |_| false).skip_absent(),
        );
        let checked = check(&Schema::number().custom(skipping, None), None, &ValidateOptions::new());
        assert!(checked.failures.is_empty());
    }

    #[test]
    fn test_async_rule_in_sync_mode_is_fatal() {
        let mut mock = MockAsyncRuleTest::new();
        mock.expect_test().never();
        let rule = Arc::new(CustomRule::new_async(BaseKind::String, "remote", "${path} taken", mock));
        let schema = Schema::string().custom(rule, None);
        let options = ValidateOptions::new();
        let ctx = RunContext {
            options: &options,
            mode: ExecMode::Sync,
        };

        let err = check_value(&schema, Some(json!("x")), "name".to_string(), ctx)
            .now_or_never()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, SchemaError::AsyncRuleInSyncRun { rule } if rule == "remote"));
    }

    #[tokio::test]
    async fn test_async_rule_in_async_mode() {
        let mut mock = MockAsyncRuleTest::new();
        mock.expect_test().times(1).returning(|_| false);
        let rule = Arc::new(CustomRule::new_async(BaseKind::String, "remote", "${path} ${value} is taken", mock));
        let schema = Schema::string().custom(rule, None);
        let options = ValidateOptions::new();
        let ctx = RunContext {
            options: &options,
            mode: ExecMode::Async,
        };

        let checked = check_value(&schema, Some(json!("bob")), "name".to_string(), ctx)
            .await
            .unwrap();
        assert_eq!(checked.failures[0].kind, "remote");
        assert_eq!(checked.failures[0].message, "name bob is taken");
    }

    #[test]
    fn test_shape_strip_unknown() {
        let fields = vec![("name".to_string(), Schema::string())];
        let record: Record = serde_json::from_value(json!({"name": "a", "extra": 1})).unwrap();

        let kept = run_record(&fields, &record, &ValidateOptions::new(), ExecMode::Sync)
            .now_or_never()
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(kept.contains_key("extra"));

        let options = ValidateOptions::new().with_strip_unknown(true);
        let stripped = run_record(&fields, &record, &options, ExecMode::Sync)
            .now_or_never()
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(stripped), json!({"name": "a"}));
    }

    #[test]
    fn test_abort_early_returns_first_failure() {
        let fields = vec![
            ("a".to_string(), Schema::string().required(None)),
            ("b".to_string(), Schema::string().required(None)),
        ];
        let record = Record::new();

        let failure = run_record(&fields, &record, &ValidateOptions::new(), ExecMode::Sync)
            .now_or_never()
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert_eq!(failure.path, "a");
        assert!(failure.inner.is_empty());

        let failure = run_record(&fields, &record, &ValidateOptions::collect_all(), ExecMode::Sync)
            .now_or_never()
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert_eq!(failure.inner.len(), 2);
        assert_eq!(failure.message, "2 errors occurred");
    }
}
