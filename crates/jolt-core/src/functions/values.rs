//! Value tests. Each one passes its argument through when the test holds
//! and yields nothing otherwise, so `"=notNull"` only writes non-null data.

use serde_json::Value;

use super::FunctionRegistry;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry
        .register("toString", to_string)
        .register("isPresent", |args: &[Value]| args.first().cloned())
        .register("notNull", |args: &[Value]| pass_if(args, |v| !v.is_null()))
        .register("isNull", |args: &[Value]| pass_if(args, Value::is_null))
        .register("isString", |args: &[Value]| pass_if(args, Value::is_string))
        .register("isNumber", |args: &[Value]| pass_if(args, Value::is_number))
        .register("isBoolean", |args: &[Value]| pass_if(args, Value::is_boolean))
        .register("isList", |args: &[Value]| pass_if(args, Value::is_array))
        .register("isMap", |args: &[Value]| pass_if(args, Value::is_object))
        .register("noop", |_: &[Value]| None);
}

fn pass_if(args: &[Value], test: impl Fn(&Value) -> bool) -> Option<Value> {
    args.first().filter(|v| test(v)).cloned()
}

fn to_string(args: &[Value]) -> Option<Value> {
    Some(Value::String(match args.first()? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: &[Value]) -> Option<Value> {
        let mut registry = FunctionRegistry::empty();
        register(&mut registry);
        registry.get(name).unwrap().apply(args)
    }

    #[test]
    fn test_to_string() {
        assert_eq!(call("toString", &[json!(1.5)]), Some(json!("1.5")));
        assert_eq!(call("toString", &[json!("s")]), Some(json!("s")));
        assert_eq!(call("toString", &[json!({"a": 1})]), Some(json!("{\"a\":1}")));
        assert_eq!(call("toString", &[]), None);
    }

    #[test]
    fn test_type_filters() {
        assert_eq!(call("isPresent", &[]), None);
        assert_eq!(call("isPresent", &[json!(null)]), Some(json!(null)));
        assert_eq!(call("notNull", &[json!(null)]), None);
        assert_eq!(call("notNull", &[json!(0)]), Some(json!(0)));
        assert_eq!(call("isString", &[json!(1)]), None);
        assert_eq!(call("isNumber", &[json!(1)]), Some(json!(1)));
        assert_eq!(call("isList", &[json!([1])]), Some(json!([1])));
        assert_eq!(call("isMap", &[json!([])]), None);
        assert_eq!(call("noop", &[json!(1)]), None);
    }
}
