//! Cardinality: coerce values between a single element and a list.
//!
//! ```json
//! { "photos": "MANY", "rating": { "@": "ONE", "*": "ONE" } }
//! ```
//!
//! `ONE` turns a list into its first element; `MANY` wraps a non-list into
//! a one-element list. `@` applies to the enclosing node itself.

use std::mem;

use serde_json::Value;

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::path::PathElement;
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of_mut, parse_lhs, require_object, ChildSpecs, Dispatch, SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use super::{unwrap_root, walk_depth, wrap_root, Transform, ROOT_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    One,
    Many,
}

impl Relationship {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ONE" => Some(Relationship::One),
            "MANY" => Some(Relationship::Many),
            _ => None,
        }
    }

    /// Rewrites `slot` in place.
    pub fn apply(self, slot: &mut Value) {
        match self {
            Relationship::One => {
                let first = match slot {
                    Value::Array(list) => Some(mem::take(list).into_iter().next().unwrap_or(Value::Null)),
                    _ => None,
                };
                if let Some(first) = first {
                    *slot = first;
                }
            }
            Relationship::Many => match slot {
                Value::Array(_) => {}
                Value::Null => *slot = Value::Array(Vec::new()),
                other => {
                    let single = mem::take(other);
                    *other = Value::Array(vec![single]);
                }
            },
        }
    }
}

#[derive(Debug)]
pub struct CardinalityTransform {
    root: CardinalityNode,
    max_walk: usize,
}

#[derive(Debug)]
enum CardinalityNode {
    Composite {
        element: PathElement,
        children: ChildSpecs<CardinalityNode>,
    },
    Leaf {
        element: PathElement,
        relationship: Relationship,
    },
}

impl SpecNode for CardinalityNode {
    fn path_element(&self) -> &PathElement {
        match self {
            CardinalityNode::Composite { element, .. } | CardinalityNode::Leaf { element, .. } => element,
        }
    }
}

impl CardinalityTransform {
    pub fn new(spec: &Value) -> Result<Self, JoltError> {
        Self::with_options(spec, &TransformOptions::default())
    }

    pub fn with_options(spec: &Value, options: &TransformOptions) -> Result<Self, JoltError> {
        let children = build_children(spec, "#", 1, options)?;
        tracing::debug!(strategy = ?children.strategy(), "built cardinality spec");
        Ok(Self {
            root: CardinalityNode::Composite {
                element: PathElement::Literal(ROOT_KEY.to_string()),
                children,
            },
            max_walk: walk_depth(options),
        })
    }

    pub fn apply(&self, input: Value) -> Result<Value, JoltError> {
        let mut wrapper = wrap_root(input);
        let mut walked = WalkedPath::new(self.max_walk);
        walked.push(None, MatchedElement::new(ROOT_KEY))?;
        self.root.apply(&mut wrapper, ROOT_KEY, None, &mut walked)?;
        Ok(unwrap_root(wrapper))
    }
}

impl Transform for CardinalityTransform {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        self.apply(input)
    }
}

fn build_children(
    spec: &Value,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ChildSpecs<CardinalityNode>, JoltError> {
    check_depth(depth, options.max_depth, spec_path)?;
    let map = require_object(spec, spec_path, "cardinality")?;
    let mut children = Vec::with_capacity(map.len());
    for (key, value) in map {
        let path = child_path(spec_path, key);
        for element in parse_lhs(key, &path)? {
            let allowed = matches!(
                element,
                PathElement::Literal(_)
                    | PathElement::StarAll
                    | PathElement::StarSingle(_)
                    | PathElement::StarDouble(_)
                    | PathElement::StarRegex(_)
                    | PathElement::Amp(_)
                    | PathElement::At
            );
            if !allowed {
                return Err(JoltError::spec(
                    &path,
                    "cardinality keys must be literals, wildcards, '&' references or '@'",
                ));
            }
            let node = match value {
                Value::Object(_) if matches!(element, PathElement::At) => {
                    return Err(JoltError::spec(&path, "'@' must map to \"ONE\" or \"MANY\""));
                }
                Value::Object(_) => CardinalityNode::Composite {
                    element,
                    children: build_children(value, &path, depth + 1, options)?,
                },
                Value::String(raw) => match Relationship::parse(raw) {
                    Some(relationship) => CardinalityNode::Leaf {
                        element,
                        relationship,
                    },
                    None => {
                        return Err(JoltError::spec(
                            &path,
                            format!("cardinality must be \"ONE\" or \"MANY\", got \"{raw}\""),
                        ))
                    }
                },
                _ => {
                    return Err(JoltError::spec(
                        &path,
                        "cardinality values must be an object, \"ONE\" or \"MANY\"",
                    ))
                }
            };
            children.push(node);
        }
    }
    ChildSpecs::new(children, spec_path)
}

impl CardinalityNode {
    /// Matches `key` of `parent` and applies this node to the value there.
    fn apply(
        &self,
        parent: &mut Value,
        key: &str,
        index: Option<usize>,
        walked: &mut WalkedPath<'_>,
    ) -> Result<bool, JoltError> {
        let Some(matched) = self.path_element().matches(key, walked)? else {
            return Ok(false);
        };
        match self {
            CardinalityNode::Leaf { relationship, .. } => {
                if let Some(slot) = child_of_mut(parent, key, index) {
                    relationship.apply(slot);
                }
            }
            CardinalityNode::Composite { children, .. } => {
                walked.push(None, matched)?;
                for special in children.special() {
                    if let CardinalityNode::Leaf { relationship, .. } = special {
                        if let Some(slot) = child_of_mut(parent, key, index) {
                            relationship.apply(slot);
                        }
                    }
                }
                if let Some(node) = child_of_mut(parent, key, index) {
                    process(children, node, walked)?;
                }
                walked.pop();
            }
        }
        Ok(true)
    }
}

fn process(
    children: &ChildSpecs<CardinalityNode>,
    node: &mut Value,
    walked: &mut WalkedPath<'_>,
) -> Result<(), JoltError> {
    if !node.is_object() && !node.is_array() {
        return Ok(());
    }
    for planned in children.plan(node, false) {
        match planned.dispatch {
            Dispatch::Literal(child) => {
                child.apply(node, &planned.key, planned.index, walked)?;
            }
            Dispatch::Computed(candidates) => {
                for child in candidates {
                    if child.apply(node, &planned.key, planned.index, walked)? {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cardinality(spec: Value, input: Value) -> Value {
        CardinalityTransform::new(&spec).unwrap().apply(input).unwrap()
    }

    #[test]
    fn test_one_takes_first() {
        assert_eq!(cardinality(json!({"input": "ONE"}), json!({"input": [5, 4]})), json!({"input": 5}));
        assert_eq!(cardinality(json!({"input": "one"}), json!({"input": []})), json!({"input": null}));
        assert_eq!(cardinality(json!({"input": "ONE"}), json!({"input": 7})), json!({"input": 7}));
    }

    #[test]
    fn test_many_wraps() {
        assert_eq!(cardinality(json!({"input": "MANY"}), json!({"input": [5, 4]})), json!({"input": [5, 4]}));
        assert_eq!(cardinality(json!({"input": "MANY"}), json!({"input": 5})), json!({"input": [5]}));
        assert_eq!(cardinality(json!({"input": "MANY"}), json!({"input": null})), json!({"input": []}));
    }

    #[test]
    fn test_at_applies_before_children() {
        let out = cardinality(
            json!({"photos": {"@": "MANY", "*": {"url": "ONE"}}}),
            json!({"photos": {"url": ["a.png", "b.png"]}}),
        );
        assert_eq!(out, json!({"photos": [{"url": "a.png"}]}));
    }

    #[test]
    fn test_star_over_array_elements() {
        let out = cardinality(json!({"list": {"*": "ONE"}}), json!({"list": [[1, 2], [3], 4]}));
        assert_eq!(out, json!({"list": [1, 3, 4]}));
    }

    #[test]
    fn test_root_at() {
        assert_eq!(cardinality(json!({"@": "MANY"}), json!({"a": 1})), json!([{"a": 1}]));
    }

    #[test]
    fn test_invalid_directive() {
        let err = CardinalityTransform::new(&json!({"a": {"b": "SOME"}})).unwrap_err();
        assert_eq!(err.path(), Some("#/a/b"));
    }
}
