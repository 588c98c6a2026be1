//! Right-hand sides of modifier specs.
//!
//! - `"=fn"` / `"=fn(arg, ...)"`: function call
//! - `"@(1,a.b)"`: value from the input
//! - `"^a.b"`: value from the context document
//! - anything else: the literal itself; `\=`, `\@`, `\^` escape the prefix

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::error::JoltError;
use crate::functions::{Function, FunctionRegistry};
use crate::path::{PathReader, TransposeElement};
use crate::walked_path::WalkedPath;

#[derive(Debug)]
pub(super) enum ValueTemplate {
    Literal(Value),
    Lookup(TransposeElement),
    Context(PathReader),
    Call(FunctionCall),
}

pub(super) struct FunctionCall {
    name: String,
    function: Arc<dyn Function>,
    /// `None` for `=fn`: the current value is the only argument.
    args: Option<Vec<ValueTemplate>>,
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

impl ValueTemplate {
    pub(super) fn parse(raw: &Value, spec_path: &str, functions: &FunctionRegistry) -> Result<Self, JoltError> {
        let Value::String(text) = raw else {
            return Ok(ValueTemplate::Literal(raw.clone()));
        };
        let parser = Parser {
            spec_path,
            functions,
        };
        if let Some(escaped) = text.strip_prefix('\\') {
            if escaped.starts_with(['=', '@', '^']) {
                return Ok(ValueTemplate::Literal(Value::String(escaped.to_string())));
            }
        }
        match text.chars().next() {
            Some('=') => parser.call(&text[1..]),
            Some('@') => parser.lookup(text),
            Some('^') => parser.context(&text[1..]),
            _ => Ok(ValueTemplate::Literal(raw.clone())),
        }
    }

    /// Produces the value to write, or `None` to leave the target alone.
    pub(super) fn evaluate(
        &self,
        current: Option<&Value>,
        walked: &WalkedPath<'_>,
        context: &Value,
    ) -> Result<Option<Value>, JoltError> {
        match self {
            ValueTemplate::Literal(value) => Ok(Some(value.clone())),
            ValueTemplate::Lookup(transpose) => Ok(transpose.object_evaluate(walked)?.cloned()),
            ValueTemplate::Context(reader) => Ok(reader.read(context, walked)?.cloned()),
            ValueTemplate::Call(call) => {
                let args = match &call.args {
                    None => current.cloned().into_iter().collect(),
                    Some(templates) => templates
                        .iter()
                        .map(|t| Ok(t.evaluate(current, walked, context)?.unwrap_or(Value::Null)))
                        .collect::<Result<Vec<_>, JoltError>>()?,
                };
                let result = call.function.apply(&args);
                if result.is_none() {
                    tracing::trace!(function = %call.name, "function returned nothing");
                }
                Ok(result)
            }
        }
    }
}

struct Parser<'p> {
    spec_path: &'p str,
    functions: &'p FunctionRegistry,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> JoltError {
        JoltError::spec(self.spec_path, message)
    }

    /// `name` or `name(args)`, without the leading `=`.
    fn call(&self, text: &str) -> Result<ValueTemplate, JoltError> {
        let text = text.trim();
        let (name, args) = match text.find('(') {
            Some(open) => {
                let Some(inner) = text[open + 1..].strip_suffix(')') else {
                    return Err(self.error(format!("unbalanced parentheses in '={text}'")));
                };
                let args = split_args(inner)
                    .map_err(|m| self.error(format!("{m} in '={text}'")))?
                    .into_iter()
                    .map(|arg| self.arg(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                (&text[..open], Some(args))
            }
            None => (text, None),
        };
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(self.error(format!("invalid function name '{name}'")));
        }
        let function = self.functions.get(name).ok_or_else(|| JoltError::UnknownFunction {
            path: self.spec_path.to_string(),
            name: name.to_string(),
        })?;
        Ok(ValueTemplate::Call(FunctionCall {
            name: name.to_string(),
            function,
            args,
        }))
    }

    fn lookup(&self, text: &str) -> Result<ValueTemplate, JoltError> {
        TransposeElement::parse(text)
            .map(ValueTemplate::Lookup)
            .map_err(|e| e.at(self.spec_path))
    }

    fn context(&self, text: &str) -> Result<ValueTemplate, JoltError> {
        PathReader::parse(text)
            .map(ValueTemplate::Context)
            .map_err(|e| e.at(self.spec_path))
    }

    fn arg(&self, token: &str) -> Result<ValueTemplate, JoltError> {
        let token = token.trim();
        if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
            return Ok(ValueTemplate::Literal(Value::String(token[1..token.len() - 1].to_string())));
        }
        match token.chars().next() {
            None => return Err(self.error("empty function argument")),
            Some('=') => return self.call(&token[1..]),
            Some('@') => return self.lookup(token),
            Some('^') => return self.context(&token[1..]),
            _ => {}
        }
        Ok(ValueTemplate::Literal(match token {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            _ => number(token).unwrap_or_else(|| Value::String(token.to_string())),
        }))
    }
}

fn number(token: &str) -> Option<Value> {
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::from(i));
    }
    token.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

/// Splits at commas outside parentheses and single quotes.
fn split_args(inner: &str) -> Result<Vec<&str>, &'static str> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.checked_sub(1).ok_or("unbalanced parentheses")?,
            ',' if !quoted && depth == 0 => {
                args.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err("unterminated quote");
    }
    if depth != 0 {
        return Err("unbalanced parentheses");
    }
    args.push(&inner[start..]);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: Value) -> Result<ValueTemplate, JoltError> {
        ValueTemplate::parse(&raw, "#/x", &FunctionRegistry::with_builtins())
    }

    #[test]
    fn test_literals_and_escapes() {
        assert!(matches!(parse(json!(5)).unwrap(), ValueTemplate::Literal(v) if v == json!(5)));
        assert!(matches!(parse(json!("plain")).unwrap(), ValueTemplate::Literal(v) if v == json!("plain")));
        assert!(matches!(parse(json!("\\=notACall")).unwrap(), ValueTemplate::Literal(v) if v == json!("=notACall")));
        assert!(matches!(parse(json!("\\@x")).unwrap(), ValueTemplate::Literal(v) if v == json!("@x")));
    }

    #[test]
    fn test_calls() {
        let ValueTemplate::Call(call) = parse(json!("=toUpper")).unwrap() else {
            panic!("expected a call");
        };
        assert_eq!(call.name, "toUpper");
        assert!(call.args.is_none());

        let ValueTemplate::Call(call) = parse(json!("=concat(@(1,a), ' - ', =toUpper(@(1,b)), 3, true)")).unwrap() else {
            panic!("expected a call");
        };
        let args = call.args.unwrap();
        assert_eq!(args.len(), 5);
        assert!(matches!(&args[0], ValueTemplate::Lookup(_)));
        assert!(matches!(&args[1], ValueTemplate::Literal(v) if v == &json!(" - ")));
        assert!(matches!(&args[2], ValueTemplate::Call(_)));
        assert!(matches!(&args[3], ValueTemplate::Literal(v) if v == &json!(3)));
        assert!(matches!(&args[4], ValueTemplate::Literal(v) if v == &json!(true)));
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("a, 'b,c', =f(1,2)").unwrap(), vec!["a", " 'b,c'", " =f(1,2)"]);
        assert_eq!(split_args("").unwrap(), Vec::<&str>::new());
        assert!(split_args("'open").is_err());
        assert!(split_args("f(1").is_err());
    }

    #[test]
    fn test_errors() {
        let err = parse(json!("=nope")).unwrap_err();
        assert!(matches!(err, JoltError::UnknownFunction { ref name, .. } if name == "nope"));
        assert_eq!(err.path(), Some("#/x"));
        assert!(parse(json!("=concat(a")).is_err());
        assert!(parse(json!("=concat(a,,b)")).is_err());
        assert!(parse(json!("@(1,a*)")).is_err());
    }

    #[test]
    fn test_evaluate_call_and_context() {
        let walked = WalkedPath::new(4);
        let context = json!({"env": {"name": "prod"}});
        let upper = parse(json!("=toUpper")).unwrap();
        assert_eq!(upper.evaluate(Some(&json!("a")), &walked, &context).unwrap(), Some(json!("A")));
        assert_eq!(upper.evaluate(None, &walked, &context).unwrap(), None);

        let ctx = parse(json!("^env.name")).unwrap();
        assert_eq!(ctx.evaluate(None, &walked, &context).unwrap(), Some(json!("prod")));
        let missing = parse(json!("^env.other")).unwrap();
        assert_eq!(missing.evaluate(None, &walked, &context).unwrap(), None);
    }
}
