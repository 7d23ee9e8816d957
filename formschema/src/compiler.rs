//! Descriptor table compilation.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::composite::CompositeValidator;
use crate::core::BaseKind;
use crate::descriptor::FieldDescriptor;
use crate::errors::SchemaError;
use crate::rules::{Rule, RuleRegistry, REGISTRY};
use crate::schema::Schema;

/// Folds descriptor tables into [`CompositeValidator`]s.
///
/// Rule names resolve against the compiler's registry first, then the
/// built-in rules of the field's kind. Compilation never mutates the
/// registry, so the same compiler can be reused and shared.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    registry: Arc<RuleRegistry>,
}

impl Default for SchemaCompiler {
    /// A compiler backed by the process-wide registry.
    fn default() -> Self {
        Self::new(Arc::clone(&REGISTRY))
    }
}

impl SchemaCompiler {
    /// Creates a compiler resolving custom rules from `registry`.
    #[must_use]
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    /// The registry custom rules resolve from.
    #[must_use]
    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Compiles a descriptor table.
    ///
    /// Descriptors with an unknown `validationType` are skipped, as are
    /// rule names the kind does not support. A repeated id replaces the
    /// earlier schema in place.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRuleParams`] when a supported rule has
    /// parameters it cannot use.
    pub fn compile(
        &self,
        descriptors: impl AsRef<[FieldDescriptor]>,
    ) -> Result<CompositeValidator, SchemaError> {
        let descriptors = descriptors.as_ref();
        let mut validator = CompositeValidator::new();
        let mut seen = HashSet::new();

        for descriptor in descriptors {
            let Some(schema) = self.compile_field(descriptor)? else {
                continue;
            };
            if !seen.insert(descriptor.id.as_str()) {
                warn!(field = %descriptor.id, "Duplicate field id; later descriptor replaces earlier");
            }
            validator.insert(descriptor.id.clone(), schema);
        }

        debug!(
            descriptors = descriptors.len(),
            fields = validator.len(),
            "Compiled descriptor table"
        );
        Ok(validator)
    }

    /// Compiles one descriptor. Returns `Ok(None)` when its kind is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRuleParams`] for unusable parameters.
    pub fn compile_field(&self, descriptor: &FieldDescriptor) -> Result<Option<Schema>, SchemaError> {
        let Some(kind) = BaseKind::parse(&descriptor.validation_type) else {
            debug!(
                field = %descriptor.id,
                validation_type = %descriptor.validation_type,
                "Skipping descriptor with unknown validation type"
            );
            return Ok(None);
        };

        let mut schema = Schema::new(kind);
        for spec in &descriptor.validations {
            match Rule::resolve(kind, &spec.rule_name, &spec.params, &descriptor.id, &self.registry)? {
                Some(rule) => {
                    debug!(field = %descriptor.id, rule = %spec.rule_name, %kind, "Applying rule");
                    schema = schema.apply(rule);
                }
                None => {
                    debug!(field = %descriptor.id, rule = %spec.rule_name, %kind, "Skipping unknown rule");
                }
            }
        }
        Ok(Some(schema))
    }
}

/// Compiles `descriptors` against the process-wide registry.
///
/// # Errors
///
/// See [`SchemaCompiler::compile`].
pub fn compile(descriptors: impl AsRef<[FieldDescriptor]>) -> Result<CompositeValidator, SchemaError> {
    SchemaCompiler::default().compile(descriptors)
}
