use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{as_i64, FunctionRegistry};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry
        .register("size", size)
        .register("firstElement", |args: &[Value]| list(args)?.first().cloned())
        .register("lastElement", |args: &[Value]| list(args)?.last().cloned())
        .register("elementAt", element_at)
        .register("toList", to_list)
        .register("sort", sort)
        .register("squashNulls", |args: &[Value]| args.first().map(|v| squash(v, false)))
        .register("recursivelySquashNulls", |args: &[Value]| args.first().map(|v| squash(v, true)))
        .register("indexOf", index_of);
}

fn list(args: &[Value]) -> Option<&Vec<Value>> {
    args.first()?.as_array()
}

fn size(args: &[Value]) -> Option<Value> {
    let n = match args.first()? {
        Value::Array(list) => list.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        _ => return None,
    };
    Some(Value::from(n))
}

/// `elementAt(list, index)`; the arguments may also come index first.
fn element_at(args: &[Value]) -> Option<Value> {
    let (items, index) = match args {
        [Value::Array(items), index] | [index, Value::Array(items)] => (items, index),
        _ => return None,
    };
    let index = usize::try_from(as_i64(index)?).ok()?;
    items.get(index).cloned()
}

fn to_list(args: &[Value]) -> Option<Value> {
    match args {
        [] => None,
        [Value::Array(items)] => Some(Value::Array(items.clone())),
        [Value::Null] => Some(Value::Array(Vec::new())),
        [single] => Some(Value::Array(vec![single.clone()])),
        many => Some(Value::Array(many.to_vec())),
    }
}

/// Sorts a list of all strings or all numbers; anything mixed is left alone.
fn sort(args: &[Value]) -> Option<Value> {
    let mut items = list(args)?.clone();
    if items.iter().all(Value::is_string) {
        items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    } else if items.iter().all(Value::is_number) {
        items.sort_by(|a, b| {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        return None;
    }
    Some(Value::Array(items))
}

fn squash(value: &Value, recursive: bool) -> Value {
    let descend = |v: &Value| if recursive { squash(v, true) } else { v.clone() };
    match value {
        Value::Array(items) => Value::Array(items.iter().filter(|v| !v.is_null()).map(descend).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), descend(v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// `indexOf(list, value)`: the first position of `value`, or -1.
fn index_of(args: &[Value]) -> Option<Value> {
    let [Value::Array(items), needle] = args else {
        return None;
    };
    let position = items.iter().position(|v| v == needle);
    Some(Value::from(position.map_or(-1, |i| i as i64)))
}
