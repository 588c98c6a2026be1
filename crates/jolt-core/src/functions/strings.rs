use regex::Regex;
use serde_json::Value;

use super::{as_i64, spread, FunctionRegistry};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry
        .register("toLower", |args: &[Value]| map_str(args, |s| s.to_lowercase()))
        .register("toUpper", |args: &[Value]| map_str(args, |s| s.to_uppercase()))
        .register("trim", |args: &[Value]| map_str(args, |s| s.trim().to_string()))
        .register("concat", concat)
        .register("join", join)
        .register("split", split)
        .register("substring", substring)
        .register("leftPad", |args: &[Value]| pad(args, true))
        .register("rightPad", |args: &[Value]| pad(args, false))
        .register("startsWith", |args: &[Value]| test_str(args, |s, p| s.starts_with(p)))
        .register("endsWith", |args: &[Value]| test_str(args, |s, p| s.ends_with(p)));
}

fn map_str(args: &[Value], f: impl Fn(&str) -> String) -> Option<Value> {
    match args.first()? {
        Value::String(s) => Some(Value::String(f(s))),
        _ => None,
    }
}

/// Strings as-is, other scalars in their JSON form. Containers have none.
fn piece(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn concat(args: &[Value]) -> Option<Value> {
    let mut out = String::new();
    for arg in spread(args) {
        if arg.is_null() {
            continue;
        }
        out.push_str(&piece(arg)?);
    }
    Some(Value::String(out))
}

/// `join(separator, values...)`; nulls are skipped.
fn join(args: &[Value]) -> Option<Value> {
    let (separator, rest) = args.split_first()?;
    let separator = separator.as_str()?;
    let pieces: Vec<String> = spread(rest)
        .iter()
        .filter(|v| !v.is_null())
        .map(piece)
        .collect::<Option<_>>()?;
    Some(Value::String(pieces.join(separator)))
}

/// `split(regex, string)`.
fn split(args: &[Value]) -> Option<Value> {
    let [Value::String(pattern), Value::String(s)] = args else {
        return None;
    };
    let re = Regex::new(pattern).ok()?;
    Some(Value::Array(
        re.split(s).map(|part| Value::String(part.to_string())).collect(),
    ))
}

/// `substring(string, start, end)` over chars; out-of-range bounds yield nothing.
fn substring(args: &[Value]) -> Option<Value> {
    let [Value::String(s), start, end] = args else {
        return None;
    };
    let start = usize::try_from(as_i64(start)?).ok()?;
    let end = usize::try_from(as_i64(end)?).ok()?;
    let len = s.chars().count();
    if start > end || end > len {
        return None;
    }
    Some(Value::String(s.chars().skip(start).take(end - start).collect()))
}

/// `leftPad(string, width, padChar)`.
fn pad(args: &[Value], left: bool) -> Option<Value> {
    let [Value::String(s), width, Value::String(fill)] = args else {
        return None;
    };
    let width = usize::try_from(as_i64(width)?).ok()?;
    let mut fill_chars = fill.chars();
    let (Some(fill), None) = (fill_chars.next(), fill_chars.next()) else {
        return None;
    };
    let missing = width.saturating_sub(s.chars().count());
    let padding: String = std::iter::repeat(fill).take(missing).collect();
    Some(Value::String(if left {
        padding + s
    } else {
        format!("{s}{padding}")
    }))
}

fn test_str(args: &[Value], f: impl Fn(&str, &str) -> bool) -> Option<Value> {
    let [Value::String(s), Value::String(p)] = args else {
        return None;
    };
    Some(Value::Bool(f(s, p)))
}
