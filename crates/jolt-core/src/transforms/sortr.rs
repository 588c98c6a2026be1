//! Sortr: recursively sort object keys.
//!
//! Keys starting with `~` come first, then everything else alphabetically.
//! Array order is preserved; array members are sorted in place.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::JoltError;

use super::Transform;

/// Takes no spec; any spec value is accepted and ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sortr;

impl Sortr {
    pub fn new(_spec: &Value) -> Result<Self, JoltError> {
        Ok(Sortr)
    }

    pub fn apply(&self, input: Value) -> Value {
        sort_value(input)
    }
}

impl Transform for Sortr {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        Ok(self.apply(input))
    }
}

fn sort_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_value(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(list) => Value::Array(list.into_iter().map(sort_value).collect()),
        scalar => scalar,
    }
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.starts_with('~'), b.starts_with('~')) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_tilde_keys_first() {
        let out = Sortr.apply(json!({"b": 1, "~z": 2, "a": 3, "~a": 4}));
        assert_eq!(keys(&out), vec!["~a", "~z", "a", "b"]);
    }

    #[test]
    fn test_nested_and_arrays() {
        let out = Sortr.apply(json!({"list": [{"y": 1, "x": 2}, 3], "inner": {"d": 1, "c": 2}}));
        assert_eq!(keys(&out), vec!["inner", "list"]);
        assert_eq!(keys(&out["inner"]), vec!["c", "d"]);
        assert_eq!(keys(&out["list"][0]), vec!["x", "y"]);
        assert_eq!(out["list"][1], json!(3));
    }
}
