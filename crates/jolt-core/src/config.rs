//! Configuration for building transforms and chains.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of transform a chain stage runs.
///
/// Serialized in `kebab-case`; the modifier flavours also accept their names
/// without the `-beta` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Move data from input paths to output paths.
    Shift,
    /// Fill in values that are absent or null.
    Default,
    /// Delete matching keys and array elements.
    Remove,
    /// Coerce values between a single element and a list.
    Cardinality,
    /// Keep only elements whose fields match a predicate set.
    Filtr,
    /// Recursively sort object keys.
    Sort,
    /// Compute values and write them unconditionally.
    #[serde(alias = "modify-overwrite")]
    ModifyOverwriteBeta,
    /// Compute values and write them where absent or null.
    #[serde(alias = "modify-default")]
    ModifyDefaultBeta,
    /// Compute values and write them only where absent.
    #[serde(alias = "modify-define")]
    ModifyDefineBeta,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Shift => "shift",
            Operation::Default => "default",
            Operation::Remove => "remove",
            Operation::Cardinality => "cardinality",
            Operation::Filtr => "filtr",
            Operation::Sort => "sort",
            Operation::ModifyOverwriteBeta => "modify-overwrite-beta",
            Operation::ModifyDefaultBeta => "modify-default-beta",
            Operation::ModifyDefineBeta => "modify-define-beta",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options shared by every transform.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`). Missing fields
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransformOptions {
    /// Maximum spec nesting depth, also applied to the walked path during a
    /// transform (stack overflow guard). Default: 64.
    pub max_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}
