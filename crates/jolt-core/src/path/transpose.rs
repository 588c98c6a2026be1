use serde_json::Value;

use crate::error::JoltError;
use crate::walked_path::WalkedPath;

use super::element::{ArrayIndex, PathElement};
use super::evaluating::PathReader;
use super::lexer::{contains_special, ends_with_special, lex, reescape, starts_with_special};
use super::GrammarError;

/// `@(up,path)`: walk `up` frames up the walked path, then read `path`
/// inside that frame's input node.
#[derive(Debug, Clone)]
pub struct TransposeElement {
    up_level: usize,
    sub_path: Option<PathReader>,
}

impl TransposeElement {
    /// Parses `@`, `@3`, `@(3)`, `@(3,a.b)`, `@(a.b)` and `@a`.
    pub fn parse(key: &str) -> Result<Self, GrammarError> {
        let err = |message: &str| GrammarError::new(key, message);
        let lexemes = lex(key);
        if !starts_with_special(&lexemes, '@') {
            return Err(err("transpose must start with '@'"));
        }
        let meat = &lexemes[1..];
        if meat.is_empty() {
            return Ok(Self {
                up_level: 0,
                sub_path: None,
            });
        }
        if contains_special(meat, '@') {
            return Err(err("'@' can not be nested inside a transpose"));
        }
        if contains_special(meat, '*') {
            return Err(err("'*' is not allowed inside a transpose"));
        }
        let meat = if starts_with_special(meat, '(') {
            if !ends_with_special(meat, ')') || meat.len() < 2 {
                return Err(err("unbalanced parentheses"));
            }
            &meat[1..meat.len() - 1]
        } else {
            meat
        };
        if meat.is_empty() {
            return Err(err("'@()' needs a level or a path"));
        }

        let (up_level, rest) = if !meat[0].escaped && meat[0].ch.is_ascii_digit() {
            let comma = meat.iter().position(|l| l.is(','));
            let digits = &meat[..comma.unwrap_or(meat.len())];
            if !digits.iter().all(|l| !l.escaped && l.ch.is_ascii_digit()) {
                return Err(err("level must be a non-negative integer, e.g. '@(2,path)'"));
            }
            let level: String = digits.iter().map(|l| l.ch).collect();
            let level = level
                .parse::<usize>()
                .map_err(|_| err("level is too large"))?;
            let rest = match comma {
                Some(i) => &meat[i + 1..],
                None => &[][..],
            };
            (level, rest)
        } else {
            (0, meat)
        };

        let sub_path = if rest.is_empty() {
            None
        } else {
            let reader = PathReader::parse(&reescape(rest)).map_err(|e| GrammarError::new(key, e.message()))?;
            if reader
                .elements()
                .iter()
                .any(|e| matches!(e, PathElement::ArrayIndex(ArrayIndex::AutoExpand)))
            {
                return Err(err("'[]' is not allowed inside a transpose"));
            }
            Some(reader)
        };
        Ok(Self { up_level, sub_path })
    }

    pub fn up_level(&self) -> usize {
        self.up_level
    }

    pub fn canonical_form(&self) -> String {
        match &self.sub_path {
            Some(reader) => format!("@({},{})", self.up_level, reader.canonical_form()),
            None => format!("@({},)", self.up_level),
        }
    }

    /// The data this transpose points at, if it exists.
    pub fn object_evaluate<'a>(&self, walked: &WalkedPath<'a>) -> Result<Option<&'a Value>, JoltError> {
        let Some(step) = walked.element_from_end(self.up_level) else {
            return Err(JoltError::ReferenceOutOfRange {
                reference: self.canonical_form(),
                depth: walked.len(),
                groups: 0,
            });
        };
        let Some(tree) = step.tree() else {
            return Ok(None);
        };
        match &self.sub_path {
            Some(reader) => reader.read(tree, walked),
            None => Ok(Some(tree)),
        }
    }

    /// The data this transpose points at, as a key. Only scalars qualify.
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<Option<String>, JoltError> {
        Ok(self.object_evaluate(walked)?.and_then(scalar_key))
    }
}

/// String form of a scalar used as a key; whole floats drop their `.0`.
pub(crate) fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    return Some(format!("{}", f as i64));
                }
            }
            Some(n.to_string())
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
