//! Custom rule registry.
//!
//! Custom rules extend a base kind with a named predicate. Compilers resolve
//! descriptor rule names against a registry before falling back to the
//! built-in rules, so a registered rule may shadow a built-in one.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::BaseKind;

/// Synchronous predicate over a candidate value.
pub type SyncRuleTest = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Asynchronous predicate over a candidate value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AsyncRuleTest: Send + Sync {
    /// Returns `true` when the value passes.
    async fn test(&self, value: &Value) -> bool;
}

/// The predicate behind a custom rule.
#[derive(Clone)]
pub enum RuleTest {
    /// Evaluated inline.
    Sync(SyncRuleTest),
    /// Awaited; only usable from asynchronous validation runs.
    Async(Arc<dyn AsyncRuleTest>),
}

impl fmt::Debug for RuleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("RuleTest::Sync"),
            Self::Async(_) => f.write_str("RuleTest::Async"),
        }
    }
}

/// A named predicate registered against a base kind.
#[derive(Debug, Clone)]
pub struct CustomRule {
    kind: BaseKind,
    rule_name: String,
    test_name: String,
    default_message: String,
    test: RuleTest,
    skip_absent: bool,
}

impl CustomRule {
    /// Creates a rule with a synchronous test.
    ///
    /// The test name reported on failure defaults to the rule name.
    pub fn new<F>(
        kind: BaseKind,
        rule_name: impl Into<String>,
        default_message: impl Into<String>,
        test: F,
    ) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::with_test(kind, rule_name, default_message, RuleTest::Sync(Arc::new(test)))
    }

    /// Creates a rule with an asynchronous test.
    pub fn new_async<T>(
        kind: BaseKind,
        rule_name: impl Into<String>,
        default_message: impl Into<String>,
        test: T,
    ) -> Self
    where
        T: AsyncRuleTest + 'static,
    {
        Self::with_test(kind, rule_name, default_message, RuleTest::Async(Arc::new(test)))
    }

    fn with_test(
        kind: BaseKind,
        rule_name: impl Into<String>,
        default_message: impl Into<String>,
        test: RuleTest,
    ) -> Self {
        let rule_name = rule_name.into();
        Self {
            kind,
            test_name: rule_name.clone(),
            rule_name,
            default_message: default_message.into(),
            test,
            skip_absent: false,
        }
    }

    /// Sets the failure kind reported in field errors.
    #[must_use]
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = test_name.into();
        self
    }

    /// Skips the test when the value is missing or null.
    #[must_use]
    pub fn skip_absent(mut self) -> Self {
        self.skip_absent = true;
        self
    }

    /// The base kind this rule extends.
    #[must_use]
    pub fn kind(&self) -> BaseKind {
        self.kind
    }

    /// The name descriptors reference.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// The failure kind reported in field errors.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Message used when the descriptor supplies none.
    #[must_use]
    pub fn default_message(&self) -> &str {
        &self.default_message
    }

    /// The predicate.
    #[must_use]
    pub fn test(&self) -> &RuleTest {
        &self.test
    }

    /// True when absent values bypass the test.
    #[must_use]
    pub fn skips_absent(&self) -> bool {
        self.skip_absent
    }

    /// True when the test must be awaited.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self.test, RuleTest::Async(_))
    }
}

/// In-memory registry of custom rules keyed by kind and rule name.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: RwLock<HashMap<(BaseKind, String), Arc<CustomRule>>>,
}

impl RuleRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all registered rules (primarily for tests).
    pub fn clear(&self) {
        self.rules.write().clear();
    }

    /// Registers a rule. A rule already registered under the same kind and
    /// name is replaced.
    pub fn register(&self, rule: CustomRule) -> Arc<CustomRule> {
        let key = (rule.kind, rule.rule_name.clone());
        let rule = Arc::new(rule);

        let previous = self.rules.write().insert(key, Arc::clone(&rule));
        if previous.is_some() {
            warn!(
                kind = %rule.kind,
                rule = %rule.rule_name,
                "Custom rule re-registered; the latest registration wins"
            );
        } else {
            debug!(kind = %rule.kind, rule = %rule.rule_name, "Custom rule registered");
        }
        rule
    }

    /// Fetches a rule for a kind.
    #[must_use]
    pub fn get(&self, kind: BaseKind, rule_name: &str) -> Option<Arc<CustomRule>> {
        self.rules
            .read()
            .get(&(kind, rule_name.to_string()))
            .cloned()
    }

    /// True when a rule is registered for a kind.
    #[must_use]
    pub fn contains(&self, kind: BaseKind, rule_name: &str) -> bool {
        self.rules.read().contains_key(&(kind, rule_name.to_string()))
    }

    /// Returns all rules, optionally filtered by kind, sorted by kind then name.
    #[must_use]
    pub fn list(&self, kind: Option<BaseKind>) -> Vec<Arc<CustomRule>> {
        let rules = self.rules.read();
        let mut result: Vec<_> = rules
            .values()
            .filter(|r| kind.is_none() || kind == Some(r.kind))
            .cloned()
            .collect();
        result.sort_by(|a, b| (a.kind, &a.rule_name).cmp(&(b.kind, &b.rule_name)));
        result
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}

/// Process-wide rule registry used by [`crate::compile`].
pub static REGISTRY: std::sync::LazyLock<Arc<RuleRegistry>> =
    std::sync::LazyLock::new(|| Arc::new(RuleRegistry::new()));

/// Registers a rule in the process-wide registry.
///
/// Meant to be called once at startup, before any compilation that
/// references the rule.
pub fn register_rule(rule: CustomRule) -> Arc<CustomRule> {
    REGISTRY.register(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at_least_ten() -> CustomRule {
        CustomRule::new(
            BaseKind::Number,
            "customValidation",
            "${path} cannot be less than 10",
            |v| v.as_f64().is_some_and(|n| n >= 10.0),
        )
        .with_test_name("custom")
    }

    #[test]
    fn test_custom_rule_accessors() {
        let rule = at_least_ten();
        assert_eq!(rule.kind(), BaseKind::Number);
        assert_eq!(rule.rule_name(), "customValidation");
        assert_eq!(rule.test_name(), "custom");
        assert!(!rule.skips_absent());
        assert!(!rule.is_async());

        let RuleTest::Sync(test) = rule.test() else {
            panic!("expected a sync test");
        };
        assert!(test(&json!(10)));
        assert!(!test(&json!(9.5)));
        assert!(!test(&json!(null)));
    }

    #[test]
    fn test_test_name_defaults_to_rule_name() {
        let rule = CustomRule::new(BaseKind::String, "slug", "bad slug", |_| true).skip_absent();
        assert_eq!(rule.test_name(), "slug");
        assert!(rule.skips_absent());
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = RuleRegistry::new();
        registry.register(at_least_ten());

        assert!(registry.contains(BaseKind::Number, "customValidation"));
        assert!(!registry.contains(BaseKind::String, "customValidation"));
        assert!(registry.get(BaseKind::Number, "missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_last_registration_wins() {
        let registry = RuleRegistry::new();
        registry.register(at_least_ten());
        registry.register(
            CustomRule::new(BaseKind::Number, "customValidation", "second", |_| true)
                .with_test_name("second"),
        );

        assert_eq!(registry.len(), 1);
        let rule = registry.get(BaseKind::Number, "customValidation").unwrap();
        assert_eq!(rule.test_name(), "second");
        assert_eq!(rule.default_message(), "second");
    }

    #[test]
    fn test_registry_list_and_clear() {
        let registry = RuleRegistry::new();
        registry.register(at_least_ten());
        registry.register(CustomRule::new(BaseKind::String, "slug", "bad", |_| true));
        registry.register(CustomRule::new(BaseKind::Number, "even", "odd", |_| true));

        let all = registry.list(None);
        let names: Vec<_> = all.iter().map(|r| r.rule_name()).collect();
        assert_eq!(names, vec!["slug", "customValidation", "even"]);

        assert_eq!(registry.list(Some(BaseKind::Number)).len(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_async_rule_uses_mock() {
        let mut mock = MockAsyncRuleTest::new();
        mock.expect_test()
            .withf(|v| v == &json!("taken"))
            .times(1)
            .returning(|_| false);

        let rule = CustomRule::new_async(BaseKind::String, "unique", "${path} is taken", mock);
        assert!(rule.is_async());

        let RuleTest::Async(test) = rule.test() else {
            panic!("expected an async test");
        };
        assert!(!test.test(&json!("taken")).await);
    }
}
