//! Configuration types for validation runs and logging.

use serde::{Deserialize, Serialize};

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "FORMSCHEMA_LOG";

/// Environment variable selecting the log format (`pretty` or `json`).
pub const LOG_FORMAT_ENV: &str = "FORMSCHEMA_LOG_FORMAT";

/// Options for a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Gather every failing field instead of stopping at the first.
    #[serde(default)]
    pub collect_all: bool,
    /// Drop record keys that have no schema entry.
    #[serde(default)]
    pub strip_unknown: bool,
    /// Skip casting and transforms; values must already have the right shape.
    #[serde(default)]
    pub strict: bool,
}

impl ValidateOptions {
    /// Creates options with defaults (abort early, keep unknown keys, cast).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options gathering every failing field.
    #[must_use]
    pub fn collect_all() -> Self {
        Self::default().with_collect_all(true)
    }

    /// Sets collect-all mode.
    #[must_use]
    pub fn with_collect_all(mut self, collect_all: bool) -> Self {
        self.collect_all = collect_all;
        self
    }

    /// Sets whether unknown keys are dropped.
    #[must_use]
    pub fn with_strip_unknown(mut self, strip_unknown: bool) -> Self {
        self.strip_unknown = strip_unknown;
        self
    }

    /// Sets strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// True when the run stops at the first failure.
    #[must_use]
    pub fn abort_early(&self) -> bool {
        !self.collect_all
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to `Pretty`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `formschema=debug`.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Creates a logging configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`LOG_FILTER_ENV`] and [`LOG_FORMAT_ENV`], keeping defaults for
    /// unset variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.format = LogFormat::parse(&format);
        }
        config
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}
