use serde_json::Value;

use crate::error::JoltError;
use crate::traversr::{ShiftrPolicy, SimplePolicy, TraversalPolicy, Traversr};
use crate::walked_path::WalkedPath;

use super::element::{parse_key, PathElement};
use super::lexer::split_dot_notation;
use super::GrammarError;

/// A dot-notation path whose segments are evaluated against the walked path
/// and then handed to a compiled [`Traversr`].
#[derive(Debug, Clone)]
pub struct EvaluatingPath<P: TraversalPolicy> {
    elements: Vec<PathElement>,
    traversr: Traversr<P>,
}

/// Reads data (transpose sub-paths, context lookups, filter fields).
pub type PathReader = EvaluatingPath<SimplePolicy>;

/// Writes shifted data; collisions collect into lists.
pub type PathWriter = EvaluatingPath<ShiftrPolicy>;

impl<P: TraversalPolicy> EvaluatingPath<P> {
    pub fn parse(dot_notation: &str) -> Result<Self, GrammarError> {
        Self::from_elements(dot_notation, Vec::new())
    }

    /// Parses `dot_notation` behind a fixed leading literal segment.
    pub(crate) fn with_prefix(prefix: &str, dot_notation: &str) -> Result<Self, GrammarError> {
        Self::from_elements(dot_notation, vec![PathElement::Literal(prefix.to_string())])
    }

    fn from_elements(dot_notation: &str, mut elements: Vec<PathElement>) -> Result<Self, GrammarError> {
        for segment in split_dot_notation(dot_notation)? {
            let element = parse_key(&segment)?;
            if !element.is_evaluatable() {
                return Err(GrammarError::new(
                    dot_notation,
                    format!("'{segment}' can not be used in a path that is written or read"),
                ));
            }
            elements.push(element);
        }
        let canonical: Vec<String> = elements.iter().map(PathElement::canonical_form).collect();
        Ok(Self {
            traversr: Traversr::new(&canonical),
            elements,
        })
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn canonical_form(&self) -> String {
        self.elements
            .iter()
            .map(PathElement::canonical_form)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The concrete keys for the current walk, or `None` when any segment
    /// has no value.
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<Option<Vec<String>>, JoltError> {
        let mut keys = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            match element.evaluate(walked)? {
                Some(key) => keys.push(key),
                None => return Ok(None),
            }
        }
        Ok(Some(keys))
    }

    pub fn read<'t>(&self, tree: &'t Value, walked: &WalkedPath<'_>) -> Result<Option<&'t Value>, JoltError> {
        match self.evaluate(walked)? {
            Some(keys) => self.traversr.get(tree, &keys),
            None => Ok(None),
        }
    }

    pub fn write(&self, data: Value, output: &mut Value, walked: &WalkedPath<'_>) -> Result<bool, JoltError> {
        match self.evaluate(walked)? {
            Some(keys) => self.traversr.set(output, &keys, data),
            None => {
                tracing::trace!(path = %self.canonical_form(), "output path did not evaluate, skipping write");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walked_path::MatchedElement;
    use serde_json::json;

    #[test]
    fn test_reader_reads_nested() {
        let reader = PathReader::parse("a.[1].b").unwrap();
        assert_eq!(reader.canonical_form(), "a.[1].b");
        let tree = json!({"a": [{}, {"b": "hit"}]});
        let walked = WalkedPath::new(4);
        assert_eq!(reader.read(&tree, &walked).unwrap(), Some(&json!("hit")));
    }

    #[test]
    fn test_writer_evaluates_references() {
        let writer = PathWriter::with_prefix("root", "&(1,2).&.value").unwrap();
        let mut walked = WalkedPath::new(8);
        walked
            .push(None, MatchedElement::with_captures("tuna-A-marlin-AAA", vec!["A".into(), "AAA".into()]))
            .unwrap();
        walked
            .push(None, MatchedElement::with_captures("rating-BBB", vec!["BBB".into()]))
            .unwrap();

        let mut output = json!({});
        assert!(writer.write(json!("bar"), &mut output, &walked).unwrap());
        assert_eq!(output, json!({"root": {"AAA": {"rating-BBB": {"value": "bar"}}}}));
    }

    #[test]
    fn test_non_evaluatable_segments_rejected() {
        assert!(PathReader::parse("a.*").is_err());
        assert!(PathReader::parse("$").is_err());
        assert!(PathWriter::parse("#x").is_err());
        assert!(PathWriter::parse("a.@").is_err());
    }
}
