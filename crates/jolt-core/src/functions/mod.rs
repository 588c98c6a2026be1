//! Functions callable from modifier specs (`"=toUpper"`, `"=concat(@(1,a),'-',b)"`).
//!
//! A function receives its evaluated arguments and returns `None` to leave
//! the target unwritten. Implicit calls (`"=toUpper"`) receive the current
//! value as their only argument, or no arguments when it is absent.

mod lists;
mod math;
mod strings;
mod values;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A named modifier function.
pub trait Function: Send + Sync {
    fn apply(&self, args: &[Value]) -> Option<Value>;
}

impl<F> Function for F
where
    F: Fn(&[Value]) -> Option<Value> + Send + Sync,
{
    fn apply(&self, args: &[Value]) -> Option<Value> {
        self(args)
    }
}

/// Name → function lookup used when a modifier spec is compiled.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// The built-in string, math, list and value functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        strings::register(&mut registry);
        math::register(&mut registry);
        lists::register(&mut registry);
        values::register(&mut registry);
        registry
    }

    /// Adds or replaces `name`.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function + 'static) -> &mut Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}

/// A single array argument stands for its members.
pub(crate) fn spread(args: &[Value]) -> &[Value] {
    match args {
        [Value::Array(members)] => members,
        _ => args,
    }
}

/// Numeric view of a number or numeric string.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer view; floats truncate toward zero.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

pub(crate) fn f64_value(f: f64) -> Option<Value> {
    serde_json::Number::from_f64(f).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = FunctionRegistry::with_builtins();
        for name in ["toLower", "concat", "min", "divideAndRound", "squashNulls", "isPresent", "noop"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn test_closures_register() {
        let mut registry = FunctionRegistry::empty();
        registry.register("answer", |_: &[Value]| Some(json!(42)));
        let f = registry.get("answer").unwrap();
        assert_eq!(f.apply(&[]), Some(json!(42)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_spread_single_array() {
        let args = [json!([1, 2])];
        assert_eq!(spread(&args), &[json!(1), json!(2)][..]);
        let args = [json!([1]), json!(2)];
        assert_eq!(spread(&args).len(), 2);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(as_i64(&json!(3.9)), Some(3));
        assert_eq!(as_i64(&json!("-4")), Some(-4));
        assert_eq!(as_f64(&json!("2.5")), Some(2.5));
        assert_eq!(as_f64(&json!(true)), None);
    }
}
