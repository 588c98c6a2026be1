//! The transform front-ends.
//!
//! Each one compiles its JSON spec into a tree of nodes once, then walks
//! that tree against every input it is given. Compiled transforms are
//! immutable and can be shared across threads; every call owns its walked
//! path and output.

pub mod cardinality;
pub mod defaultr;
pub mod filtr;
pub mod modifier;
mod op_mode;
pub mod removr;
pub mod shiftr;
pub mod sortr;

use std::fmt::Debug;

use serde_json::{Map, Value};

use crate::config::TransformOptions;
use crate::error::JoltError;

pub use cardinality::CardinalityTransform;
pub use defaultr::Defaultr;
pub use filtr::Filtr;
pub use modifier::Modifier;
pub use op_mode::OpMode;
pub use removr::Removr;
pub use shiftr::Shiftr;
pub use sortr::Sortr;

/// Key of the synthetic level wrapped around every input, so a transform
/// can replace or write at the document root the same way it does anywhere
/// else.
pub const ROOT_KEY: &str = "root";

/// A compiled transform stage.
pub trait Transform: Send + Sync + Debug {
    /// Runs the stage. `context` is a read-only side document; only the
    /// modifiers look at it.
    fn transform(&self, input: Value, context: &Value) -> Result<Value, JoltError>;
}

/// `input` → `{"root": input}`
pub(crate) fn wrap_root(input: Value) -> Value {
    let mut map = Map::new();
    map.insert(ROOT_KEY.to_string(), input);
    Value::Object(map)
}

/// `{"root": x}` → `x`, or null when the root was removed.
pub(crate) fn unwrap_root(wrapper: Value) -> Value {
    match wrapper {
        Value::Object(mut map) => map.remove(ROOT_KEY).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Walk depth allowed for `options`: the spec depth plus the wrapper and
/// root levels.
pub(crate) fn walk_depth(options: &TransformOptions) -> usize {
    options.max_depth + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_wrapping() {
        let wrapped = wrap_root(json!([1, 2]));
        assert_eq!(wrapped, json!({"root": [1, 2]}));
        assert_eq!(unwrap_root(wrapped), json!([1, 2]));
        assert_eq!(unwrap_root(json!({})), json!(null));
    }
}
