use serde_json::Value;

use super::{as_f64, as_i64, f64_value, spread, FunctionRegistry};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry
        .register("min", |args: &[Value]| extreme(args, |candidate, best| candidate < best))
        .register("max", |args: &[Value]| extreme(args, |candidate, best| candidate > best))
        .register("abs", abs)
        .register("avg", avg)
        .register("intSum", int_sum)
        .register("longSum", int_sum)
        .register("doubleSum", double_sum)
        .register("divide", divide)
        .register("divideAndRound", divide_and_round)
        .register("toInteger", |args: &[Value]| args.first().and_then(as_i64).map(Value::from))
        .register("toLong", |args: &[Value]| args.first().and_then(as_i64).map(Value::from))
        .register("toDouble", |args: &[Value]| args.first().and_then(as_f64).and_then(f64_value))
        .register("toBoolean", to_boolean);
}

/// The numeric argument `better` than all others, returned unchanged so
/// integers stay integers. Non-numbers are ignored.
fn extreme(args: &[Value], better: impl Fn(f64, f64) -> bool) -> Option<Value> {
    let mut best: Option<(f64, &Value)> = None;
    for arg in spread(args) {
        let Value::Number(n) = arg else { continue };
        let Some(f) = n.as_f64() else { continue };
        if best.map_or(true, |(b, _)| better(f, b)) {
            best = Some((f, arg));
        }
    }
    best.map(|(_, v)| v.clone())
}

fn abs(args: &[Value]) -> Option<Value> {
    let Value::Number(n) = args.first()? else {
        return None;
    };
    match n.as_i64() {
        Some(i) => i.checked_abs().map(Value::from),
        None => f64_value(n.as_f64()?.abs()),
    }
}

fn avg(args: &[Value]) -> Option<Value> {
    let numbers: Vec<f64> = spread(args).iter().filter_map(as_f64).collect();
    if numbers.is_empty() {
        return None;
    }
    f64_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn int_sum(args: &[Value]) -> Option<Value> {
    spread(args)
        .iter()
        .filter_map(as_i64)
        .try_fold(0i64, i64::checked_add)
        .map(Value::from)
}

fn double_sum(args: &[Value]) -> Option<Value> {
    f64_value(spread(args).iter().filter_map(as_f64).sum())
}

fn quotient(numerator: &Value, denominator: &Value) -> Option<f64> {
    let denominator = as_f64(denominator)?;
    if denominator == 0.0 {
        return None;
    }
    Some(as_f64(numerator)? / denominator)
}

/// `divide(numerator, denominator)`.
fn divide(args: &[Value]) -> Option<Value> {
    let [numerator, denominator] = spread(args) else {
        return None;
    };
    f64_value(quotient(numerator, denominator)?)
}

/// `divideAndRound(digits, numerator, denominator)`, rounding half away from zero.
fn divide_and_round(args: &[Value]) -> Option<Value> {
    let [digits, numerator, denominator] = args else {
        return None;
    };
    let digits = i32::try_from(as_i64(digits)?).ok()?;
    let scale = 10f64.powi(digits);
    f64_value((quotient(numerator, denominator)? * scale).round() / scale)
}

fn to_boolean(args: &[Value]) -> Option<Value> {
    match args.first()? {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
        _ => None,
    }
}
