//! Removr: delete keys and array elements.
//!
//! Leaf values are the empty string; every matching child applies.
//!
//! ```json
//! { "tuna*": "", "photos": { "*": { "thumbnail": "" } } }
//! ```

use serde_json::Value;

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::path::PathElement;
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of_mut, parse_lhs, remove_children, require_object, ChildSpecs, SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use super::{unwrap_root, walk_depth, wrap_root, Transform, ROOT_KEY};

#[derive(Debug)]
pub struct Removr {
    children: ChildSpecs<RemovrNode>,
    max_walk: usize,
}

#[derive(Debug)]
enum RemovrNode {
    Composite {
        element: PathElement,
        children: ChildSpecs<RemovrNode>,
    },
    Leaf {
        element: PathElement,
    },
}

impl SpecNode for RemovrNode {
    fn path_element(&self) -> &PathElement {
        match self {
            RemovrNode::Composite { element, .. } | RemovrNode::Leaf { element } => element,
        }
    }
}

impl Removr {
    pub fn new(spec: &Value) -> Result<Self, JoltError> {
        Self::with_options(spec, &TransformOptions::default())
    }

    pub fn with_options(spec: &Value, options: &TransformOptions) -> Result<Self, JoltError> {
        let children = build_children(spec, "#", 1, options)?;
        tracing::debug!(children = children.iter().count(), "built remove spec");
        Ok(Self {
            children,
            max_walk: walk_depth(options),
        })
    }

    pub fn apply(&self, input: Value) -> Result<Value, JoltError> {
        let mut wrapper = wrap_root(input);
        let mut walked = WalkedPath::new(self.max_walk);
        walked.push(None, MatchedElement::new(ROOT_KEY))?;
        if let Some(node) = child_of_mut(&mut wrapper, ROOT_KEY, None) {
            remove_from(&self.children, node, &mut walked)?;
        }
        Ok(unwrap_root(wrapper))
    }
}

impl Transform for Removr {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        self.apply(input)
    }
}

fn build_children(
    spec: &Value,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ChildSpecs<RemovrNode>, JoltError> {
    check_depth(depth, options.max_depth, spec_path)?;
    let map = require_object(spec, spec_path, "remove")?;
    let mut children = Vec::with_capacity(map.len());
    for (key, value) in map {
        let path = child_path(spec_path, key);
        for element in parse_lhs(key, &path)? {
            if !matches!(
                element,
                PathElement::Literal(_)
                    | PathElement::StarAll
                    | PathElement::StarSingle(_)
                    | PathElement::StarDouble(_)
                    | PathElement::StarRegex(_)
            ) {
                return Err(JoltError::spec(&path, "remove keys must be literals or '*' wildcards"));
            }
            let node = match value {
                Value::Object(_) => RemovrNode::Composite {
                    element,
                    children: build_children(value, &path, depth + 1, options)?,
                },
                Value::String(s) if s.trim().is_empty() => RemovrNode::Leaf { element },
                _ => {
                    return Err(JoltError::spec(
                        &path,
                        "remove values must be an object or the empty string",
                    ))
                }
            };
            children.push(node);
        }
    }
    ChildSpecs::new(children, spec_path)
}

/// Applies every child to `node`: composites recurse first, then all keys
/// matched by a leaf are removed at once.
fn remove_from(
    children: &ChildSpecs<RemovrNode>,
    node: &mut Value,
    walked: &mut WalkedPath<'_>,
) -> Result<(), JoltError> {
    let keys: Vec<(String, Option<usize>)> = match &*node {
        Value::Object(map) => map.keys().map(|k| (k.clone(), None)).collect(),
        Value::Array(list) => (0..list.len()).map(|i| (i.to_string(), Some(i))).collect(),
        _ => return Ok(()),
    };

    let mut doomed: Vec<(String, Option<usize>)> = Vec::new();
    for child in children.iter() {
        for (key, index) in &keys {
            let Some(matched) = child.path_element().matches(key, walked)? else {
                continue;
            };
            match child {
                RemovrNode::Leaf { .. } => doomed.push((key.clone(), *index)),
                RemovrNode::Composite { children, .. } => {
                    if let Some(sub) = child_of_mut(node, key, *index) {
                        walked.push(None, matched)?;
                        remove_from(children, sub, walked)?;
                        walked.pop();
                    }
                }
            }
        }
    }

    remove_children(node, &doomed)
}
