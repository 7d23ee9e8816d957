//! Base validator kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The primitive category a field is validated as.
///
/// Selects the base schema for a descriptor and decides which rule names
/// are applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    /// UTF-8 text.
    String,
    /// Finite numbers.
    Number,
    /// Sequences.
    Array,
    /// Key-value maps.
    Object,
    /// `true` / `false`.
    Boolean,
    /// Points in time.
    Date,
}

impl BaseKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::String,
        Self::Number,
        Self::Array,
        Self::Object,
        Self::Boolean,
        Self::Date,
    ];

    /// Looks up a kind by its descriptor name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    /// Returns the descriptor name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
