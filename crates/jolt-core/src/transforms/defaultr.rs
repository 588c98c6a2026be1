//! Defaultr: fill in values that are absent or null.
//!
//! The spec mirrors the shape of the data; literal keys are created when
//! missing, wildcard keys apply to whatever keys already exist. A `[]`
//! suffix on a key makes the container it creates an array:
//!
//! ```json
//! { "rating": { "quality": { "value": 3 } }, "photos[]": { "0": "none.png" } }
//! ```

use serde_json::{Map, Value};

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::path::PathElement;
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of, child_of_mut, json_type, parse_lhs, require_object, ChildSpecs, SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use super::{unwrap_root, walk_depth, wrap_root, OpMode, Transform, ROOT_KEY};

#[derive(Debug)]
pub struct Defaultr {
    map_root: DefaultrNode,
    /// Only when every top-level key can address an array.
    list_root: Option<DefaultrNode>,
    max_walk: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Map,
    List,
}

impl Container {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Container::Map => value.is_object(),
            Container::List => value.is_array(),
        }
    }

    fn empty(self) -> Value {
        match self {
            Container::Map => Value::Object(Map::new()),
            Container::List => Value::Array(Vec::new()),
        }
    }
}

#[derive(Debug)]
enum DefaultrNode {
    Composite {
        element: PathElement,
        container: Container,
        children: ChildSpecs<DefaultrNode>,
    },
    Leaf {
        element: PathElement,
        value: Value,
    },
}

impl SpecNode for DefaultrNode {
    fn path_element(&self) -> &PathElement {
        match self {
            DefaultrNode::Composite { element, .. } | DefaultrNode::Leaf { element, .. } => element,
        }
    }
}

impl Defaultr {
    pub fn new(spec: &Value) -> Result<Self, JoltError> {
        Self::with_options(spec, &TransformOptions::default())
    }

    pub fn with_options(spec: &Value, options: &TransformOptions) -> Result<Self, JoltError> {
        let map_root = DefaultrNode::Composite {
            element: PathElement::Literal(ROOT_KEY.to_string()),
            container: Container::Map,
            children: build_children(spec, Container::Map, "#", 1, options)?,
        };
        let list_root = match build_children(spec, Container::List, "#", 1, options) {
            Ok(children) => Some(DefaultrNode::Composite {
                element: PathElement::Literal(ROOT_KEY.to_string()),
                container: Container::List,
                children,
            }),
            Err(_) => None,
        };
        tracing::debug!(array_root = list_root.is_some(), "built default spec");
        Ok(Self {
            map_root,
            list_root,
            max_walk: walk_depth(options),
        })
    }

    pub fn apply(&self, input: Value) -> Result<Value, JoltError> {
        let input = if input.is_null() {
            Value::Object(Map::new())
        } else {
            input
        };
        let root = match &input {
            Value::Object(_) => &self.map_root,
            Value::Array(_) => self.list_root.as_ref().ok_or_else(|| {
                JoltError::TransformError(
                    "default spec can not be applied to a top-level array: its top-level keys are not all indices or wildcards"
                        .to_string(),
                )
            })?,
            other => {
                return Err(JoltError::TransformError(format!(
                    "default can not be applied to a top-level {}",
                    json_type(other)
                )))
            }
        };

        let mut wrapper = wrap_root(input);
        let mut walked = WalkedPath::new(self.max_walk);
        walked.push(None, MatchedElement::new(ROOT_KEY))?;
        root.apply(&mut wrapper, ROOT_KEY, None, &mut walked)?;
        Ok(unwrap_root(wrapper))
    }
}

impl Transform for Defaultr {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        self.apply(input)
    }
}

/// `photos[]` → (`photos`, List). An escaped `\[]` stays part of the key.
fn split_container_suffix(key: &str) -> (&str, Container) {
    match key.strip_suffix("[]") {
        Some(stripped) if !stripped.ends_with('\\') => (stripped, Container::List),
        _ => (key, Container::Map),
    }
}

fn build_children(
    spec: &Value,
    container: Container,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ChildSpecs<DefaultrNode>, JoltError> {
    check_depth(depth, options.max_depth, spec_path)?;
    let map = require_object(spec, spec_path, "default")?;
    let mut children = Vec::with_capacity(map.len());
    for (raw_key, value) in map {
        let path = child_path(spec_path, raw_key);
        let (key, child_container) = split_container_suffix(raw_key);
        for element in parse_lhs(key, &path)? {
            match &element {
                PathElement::Literal(raw) if container == Container::List => {
                    if raw.parse::<usize>().is_err() {
                        return Err(JoltError::spec(
                            &path,
                            format!("key '{raw}' under an array default must be an index"),
                        ));
                    }
                }
                PathElement::Literal(_)
                | PathElement::StarAll
                | PathElement::StarSingle(_)
                | PathElement::StarDouble(_)
                | PathElement::StarRegex(_) => {}
                _ => {
                    return Err(JoltError::spec(
                        &path,
                        "default keys must be literals or '*' wildcards",
                    ))
                }
            }
            let node = match value {
                Value::Object(_) => DefaultrNode::Composite {
                    element,
                    container: child_container,
                    children: build_children(value, child_container, &path, depth + 1, options)?,
                },
                _ if child_container == Container::List => {
                    return Err(JoltError::spec(
                        &path,
                        "a '[]' key must map to an object of index keys",
                    ))
                }
                literal => DefaultrNode::Leaf {
                    element,
                    value: literal.clone(),
                },
            };
            children.push(node);
        }
    }
    ChildSpecs::new(children, spec_path)
}

impl DefaultrNode {
    fn apply(
        &self,
        parent: &mut Value,
        key: &str,
        index: Option<usize>,
        walked: &mut WalkedPath<'_>,
    ) -> Result<(), JoltError> {
        let Some(matched) = self.path_element().matches(key, walked)? else {
            return Ok(());
        };
        match self {
            DefaultrNode::Leaf { value, .. } => {
                OpMode::Default.write(parent, key, index, value.clone(), None);
            }
            DefaultrNode::Composite {
                container,
                children,
                ..
            } => {
                if child_of(parent, key, index).map_or(true, Value::is_null) {
                    OpMode::Default.write(parent, key, index, container.empty(), None);
                }
                let Some(node) = child_of_mut(parent, key, index) else {
                    return Ok(());
                };
                if !container.accepts(node) {
                    tracing::trace!(key, "existing value is not the container the default expects");
                    return Ok(());
                }
                walked.push(None, matched)?;
                apply_children(children, node, walked)?;
                walked.pop();
            }
        }
        Ok(())
    }
}

/// Literal children first (they may create keys), then every wildcard
/// child against every key that exists by then.
fn apply_children(
    children: &ChildSpecs<DefaultrNode>,
    node: &mut Value,
    walked: &mut WalkedPath<'_>,
) -> Result<(), JoltError> {
    for child in children.literals() {
        let key = child.literal_key();
        let index = if node.is_array() { key.parse().ok() } else { None };
        child.apply(node, key, index, walked)?;
    }
    if children.computed().is_empty() {
        return Ok(());
    }
    let keys: Vec<(String, Option<usize>)> = match &*node {
        Value::Object(map) => map.keys().map(|k| (k.clone(), None)).collect(),
        Value::Array(list) => (0..list.len()).map(|i| (i.to_string(), Some(i))).collect(),
        _ => Vec::new(),
    };
    for (key, index) in keys {
        for child in children.computed() {
            child.apply(node, &key, index, walked)?;
        }
    }
    Ok(())
}
