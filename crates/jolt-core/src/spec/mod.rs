//! The compiled spec tree shared by every transform.
//!
//! Each transform defines its own composite/leaf node type; what they share
//! is how a composite partitions its children ([`ChildSpecs`]) and how it
//! decides which child handles which input key ([`ExecutionStrategy`]).

mod strategy;

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::JoltError;
use crate::path::{compare_computed, parse_key, split_or, ElementClass, PathElement};
use crate::pointer::child_path;
use crate::traversr::Traversr;

pub use strategy::ExecutionStrategy;
pub(crate) use strategy::{Dispatch, PlannedKey};

/// A node of a compiled spec tree.
pub(crate) trait SpecNode {
    fn path_element(&self) -> &PathElement;

    /// The raw key of a literal node.
    fn literal_key(&self) -> &str {
        match self.path_element() {
            PathElement::Literal(raw) => raw,
            _ => "",
        }
    }
}

/// A composite node's children, partitioned once at build time.
#[derive(Debug)]
pub(crate) struct ChildSpecs<S> {
    literals: Vec<S>,
    literal_index: HashMap<String, usize>,
    /// Sorted most specific first.
    computed: Vec<S>,
    /// `@`, `#`, `$` and transpose keys; they run regardless of input keys.
    special: Vec<S>,
    strategy: ExecutionStrategy,
}

impl<S: SpecNode> ChildSpecs<S> {
    /// Partitions `children`, rejecting duplicate canonical keys.
    pub fn new(children: Vec<S>, spec_path: &str) -> Result<Self, JoltError> {
        let mut seen = HashSet::new();
        let mut literals = Vec::new();
        let mut literal_index = HashMap::new();
        let mut computed = Vec::new();
        let mut special = Vec::new();

        for child in children {
            let canonical = child.path_element().canonical_form();
            if !seen.insert(canonical.clone()) {
                return Err(JoltError::spec(
                    spec_path,
                    format!("duplicate key '{canonical}' among siblings"),
                ));
            }
            match child.path_element().class() {
                ElementClass::Literal => {
                    literal_index.insert(child.literal_key().to_string(), literals.len());
                    literals.push(child);
                }
                ElementClass::Computed => computed.push(child),
                ElementClass::Special => special.push(child),
                ElementClass::Index => {
                    return Err(JoltError::spec(
                        child_path(spec_path, &canonical),
                        "array index keys are not valid here",
                    ))
                }
            }
        }
        computed.sort_by(|a: &S, b: &S| compare_computed(a.path_element(), b.path_element()));

        let computed_elements: Vec<&PathElement> = computed.iter().map(SpecNode::path_element).collect();
        let strategy = ExecutionStrategy::determine(
            literals.iter().map(SpecNode::literal_key),
            &computed_elements,
        );

        Ok(Self {
            literals,
            literal_index,
            computed,
            special,
            strategy,
        })
    }

    pub fn literals(&self) -> &[S] {
        &self.literals
    }

    pub fn literal(&self, key: &str) -> Option<&S> {
        self.literal_index.get(key).map(|&i| &self.literals[i])
    }

    pub fn computed(&self) -> &[S] {
        &self.computed
    }

    pub fn special(&self) -> &[S] {
        &self.special
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Every child, literals first.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.literals
            .iter()
            .chain(self.computed.iter())
            .chain(self.special.iter())
    }

    pub fn plan(&self, input: &Value, visit_absent: bool) -> Vec<PlannedKey<'_, S>> {
        self.strategy.plan(self, input, visit_absent)
    }
}

/// Parses an LHS spec key, splitting `a|b` alternatives into one element each.
pub(crate) fn parse_lhs(key: &str, spec_path: &str) -> Result<Vec<PathElement>, JoltError> {
    split_or(key)
        .iter()
        .map(|alternative| parse_key(alternative).map_err(|e| e.at(spec_path)))
        .collect()
}

/// Requires `spec` to be a non-empty object.
pub(crate) fn require_object<'v>(
    spec: &'v Value,
    spec_path: &str,
    what: &str,
) -> Result<&'v Map<String, Value>, JoltError> {
    match spec {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(JoltError::spec(spec_path, format!("{what} spec can not be empty"))),
        other => Err(JoltError::spec(
            spec_path,
            format!("{what} spec must be a JSON object, got {}", json_type(other)),
        )),
    }
}

/// Guards spec nesting against `max_depth`.
pub(crate) fn check_depth(depth: usize, max_depth: usize, spec_path: &str) -> Result<(), JoltError> {
    if depth > max_depth {
        return Err(JoltError::RecursionDepthExceeded {
            path: spec_path.to_string(),
            max_depth,
        });
    }
    Ok(())
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The child of a container under `key` (object) or `index` (array).
pub(crate) fn child_of<'v>(container: &'v Value, key: &str, index: Option<usize>) -> Option<&'v Value> {
    match container {
        Value::Object(map) => map.get(key),
        Value::Array(list) => list.get(index.or_else(|| key.parse().ok())?),
        _ => None,
    }
}

pub(crate) fn child_of_mut<'v>(
    container: &'v mut Value,
    key: &str,
    index: Option<usize>,
) -> Option<&'v mut Value> {
    match container {
        Value::Object(map) => map.get_mut(key),
        Value::Array(list) => list.get_mut(index.or_else(|| key.parse().ok())?),
        _ => None,
    }
}

/// Removes `doomed` children from `container` through a one-step
/// [`Traversr`]. Array slots go highest index first so earlier removals do
/// not shift later ones.
pub(crate) fn remove_children(
    container: &mut Value,
    doomed: &[(String, Option<usize>)],
) -> Result<(), JoltError> {
    let (segment, keys): (&str, Vec<String>) = match container {
        Value::Object(_) => ("*", doomed.iter().map(|(key, _)| key.clone()).collect()),
        Value::Array(_) => {
            let mut indices: Vec<usize> = doomed.iter().filter_map(|(_, i)| *i).collect();
            indices.sort_unstable_by(|a, b| b.cmp(a));
            indices.dedup();
            ("[0]", indices.iter().map(usize::to_string).collect())
        }
        _ => return Ok(()),
    };
    let traversr: Traversr = Traversr::new(&[segment]);
    for key in keys {
        traversr.remove(container, std::slice::from_ref(&key))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Node(PathElement);

    impl SpecNode for Node {
        fn path_element(&self) -> &PathElement {
            &self.0
        }
    }

    fn nodes(keys: &[&str]) -> Vec<Node> {
        keys.iter().map(|k| Node(parse_key(k).unwrap())).collect()
    }

    #[test]
    fn test_partition_and_priority() {
        let specs = ChildSpecs::new(nodes(&["*", "rating", "@", "tuna-*", "#x"]), "#").unwrap();
        assert_eq!(specs.literals().len(), 1);
        assert!(specs.literal("rating").is_some());
        let computed: Vec<String> = specs
            .computed()
            .iter()
            .map(|n| n.0.canonical_form())
            .collect();
        assert_eq!(computed, vec!["tuna-*", "*"]);
        assert_eq!(specs.special().len(), 2);
        assert_eq!(specs.strategy(), ExecutionStrategy::Conflict);
        assert_eq!(specs.iter().count(), 5);
    }

    #[test]
    fn test_duplicate_canonical_keys_rejected() {
        let err = ChildSpecs::new(nodes(&["&1", "&(1,0)"]), "#/a").unwrap_err();
        assert_eq!(err.path(), Some("#/a"));
        assert!(err.to_string().contains("duplicate key '&(1,0)'"));
    }

    #[test]
    fn test_plan_conflict_prefers_literal() {
        let specs = ChildSpecs::new(nodes(&["tuna-1", "tuna-*"]), "#").unwrap();
        let input = json!({"tuna-1": 1, "tuna-2": 2});
        let plan = specs.plan(&input, false);
        assert_eq!(plan.len(), 2);
        assert!(matches!(plan[0].dispatch, Dispatch::Literal(_)));
        assert!(matches!(plan[1].dispatch, Dispatch::Computed(c) if c.len() == 1));
    }

    #[test]
    fn test_plan_visits_absent_literals() {
        let specs = ChildSpecs::new(nodes(&["a", "b"]), "#").unwrap();
        let input = json!({"a": 1});
        assert_eq!(specs.plan(&input, false).len(), 1);
        let keys: Vec<String> = specs.plan(&input, true).into_iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_plan_array_literals_are_indices() {
        let specs = ChildSpecs::new(nodes(&["1", "5"]), "#").unwrap();
        let input = json!(["x", "y"]);
        let plan = specs.plan(&input, false);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].index, Some(1));
    }

    #[test]
    fn test_parse_lhs_splits_or() {
        let elements = parse_lhs("a|b*", "#").unwrap();
        assert_eq!(elements.len(), 2);
        assert!(parse_lhs("a|a&*", "#/x").is_err());
    }

    #[test]
    fn test_require_object() {
        assert!(require_object(&json!({"a": 1}), "#", "shift").is_ok());
        assert!(require_object(&json!({}), "#", "shift").is_err());
        let err = require_object(&json!([1]), "#", "shift").unwrap_err();
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn test_remove_children() {
        let mut map = json!({"a": 1, "b": 2, "c": 3});
        remove_children(&mut map, &[("c".to_string(), None), ("a".to_string(), None), ("zz".to_string(), None)])
            .unwrap();
        assert_eq!(map, json!({"b": 2}));

        let mut list = json!(["x", "y", "z", "w"]);
        let doomed = [
            ("1".to_string(), Some(1)),
            ("3".to_string(), Some(3)),
            ("1".to_string(), Some(1)),
            ("9".to_string(), Some(9)),
        ];
        remove_children(&mut list, &doomed).unwrap();
        assert_eq!(list, json!(["x", "z"]));

        let mut scalar = json!("text");
        remove_children(&mut scalar, &doomed).unwrap();
        assert_eq!(scalar, json!("text"));
    }
}
