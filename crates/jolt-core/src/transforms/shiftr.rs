//! Shiftr: copy data from where it is in the input to where the spec says
//! it goes in a fresh output document.
//!
//! The spec mirrors the input. Keys match input keys (with wildcards,
//! references and transposes); leaf values are output paths evaluated
//! against the walked path:
//!
//! ```json
//! { "rating": { "primary": { "value": "Rating", "max": "RatingRange" } } }
//! ```

use serde_json::{Map, Value};

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::path::{PathElement, PathWriter};
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of, parse_lhs, require_object, ChildSpecs, Dispatch, ExecutionStrategy, SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use super::{unwrap_root, walk_depth, Transform, ROOT_KEY};

#[derive(Debug)]
pub struct Shiftr {
    root: ShiftrNode,
    max_walk: usize,
}

#[derive(Debug)]
enum ShiftrNode {
    Composite(Composite),
    Leaf(Leaf),
}

#[derive(Debug)]
struct Composite {
    element: PathElement,
    children: ChildSpecs<ShiftrNode>,
}

#[derive(Debug)]
struct Leaf {
    element: PathElement,
    /// Empty for a `null` leaf: match, but write nothing.
    writers: Vec<PathWriter>,
}

impl SpecNode for ShiftrNode {
    fn path_element(&self) -> &PathElement {
        match self {
            ShiftrNode::Composite(c) => &c.element,
            ShiftrNode::Leaf(l) => &l.element,
        }
    }
}

impl Shiftr {
    pub fn new(spec: &Value) -> Result<Self, JoltError> {
        Self::with_options(spec, &TransformOptions::default())
    }

    pub fn with_options(spec: &Value, options: &TransformOptions) -> Result<Self, JoltError> {
        let children = build_children(spec, "#", 1, options)?;
        tracing::debug!(
            strategy = ?children.strategy(),
            children = children.iter().count(),
            "built shift spec"
        );
        Ok(Self {
            root: ShiftrNode::Composite(Composite {
                element: PathElement::Literal(ROOT_KEY.to_string()),
                children,
            }),
            max_walk: walk_depth(options),
        })
    }

    /// How the top-level keys of the spec are matched.
    pub fn root_strategy(&self) -> ExecutionStrategy {
        match &self.root {
            ShiftrNode::Composite(c) => c.children.strategy(),
            ShiftrNode::Leaf(_) => ExecutionStrategy::AllLiterals,
        }
    }

    /// Runs the shift against a borrowed input; the input is only read.
    pub fn apply(&self, input: &Value) -> Result<Value, JoltError> {
        let mut output = Value::Object(Map::new());
        let mut walked = WalkedPath::new(self.max_walk);
        walked.push(Some(input), MatchedElement::new(ROOT_KEY))?;
        self.root.apply(ROOT_KEY, Some(input), &mut walked, &mut output)?;
        Ok(unwrap_root(output))
    }
}

impl Transform for Shiftr {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        self.apply(&input)
    }
}

fn build_children(
    spec: &Value,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ChildSpecs<ShiftrNode>, JoltError> {
    check_depth(depth, options.max_depth, spec_path)?;
    let map = require_object(spec, spec_path, "shift")?;
    let mut children = Vec::with_capacity(map.len());
    for (key, value) in map {
        let path = child_path(spec_path, key);
        for element in parse_lhs(key, &path)? {
            children.push(build_node(element, value, &path, depth, options)?);
        }
    }
    ChildSpecs::new(children, spec_path)
}

fn build_node(
    element: PathElement,
    value: &Value,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ShiftrNode, JoltError> {
    match value {
        Value::Object(_) => {
            if matches!(element, PathElement::Hash(_) | PathElement::Dollar(_)) {
                return Err(JoltError::spec(
                    spec_path,
                    "'#' and '$' keys must map to an output path, not an object",
                ));
            }
            Ok(ShiftrNode::Composite(Composite {
                element,
                children: build_children(value, spec_path, depth + 1, options)?,
            }))
        }
        Value::String(path) => Ok(ShiftrNode::Leaf(Leaf {
            element,
            writers: vec![parse_writer(path, spec_path)?],
        })),
        Value::Array(paths) => {
            let writers = paths
                .iter()
                .map(|p| match p {
                    Value::String(path) => parse_writer(path, spec_path),
                    _ => Err(JoltError::spec(
                        spec_path,
                        "every entry of an output path list must be a string",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ShiftrNode::Leaf(Leaf { element, writers }))
        }
        Value::Null => Ok(ShiftrNode::Leaf(Leaf {
            element,
            writers: Vec::new(),
        })),
        Value::Bool(_) | Value::Number(_) => Err(JoltError::spec(
            spec_path,
            "shift values must be an object, an output path, a list of output paths, or null",
        )),
    }
}

fn parse_writer(path: &str, spec_path: &str) -> Result<PathWriter, JoltError> {
    PathWriter::with_prefix(ROOT_KEY, path).map_err(|e| e.at(spec_path))
}

impl ShiftrNode {
    /// Returns whether this node matched `key`.
    fn apply<'a>(
        &self,
        key: &str,
        input: Option<&'a Value>,
        walked: &mut WalkedPath<'a>,
        output: &mut Value,
    ) -> Result<bool, JoltError> {
        match self {
            ShiftrNode::Composite(c) => c.apply(key, input, walked, output),
            ShiftrNode::Leaf(l) => l.apply(key, input, walked, output),
        }
    }
}

impl Composite {
    fn apply<'a>(
        &self,
        key: &str,
        input: Option<&'a Value>,
        walked: &mut WalkedPath<'a>,
        output: &mut Value,
    ) -> Result<bool, JoltError> {
        let Some(matched) = self.element.matches(key, walked)? else {
            return Ok(false);
        };
        let input = match &self.element {
            PathElement::Transpose(t) => match t.object_evaluate(walked)? {
                Some(found) => Some(found),
                None => return Ok(false),
            },
            _ => input,
        };

        walked.push(input, matched)?;
        for special in self.children.special() {
            special.apply(key, input, walked, output)?;
        }
        if let Some(node) = input {
            for planned in self.children.plan(node, false) {
                let child_input = child_of(node, &planned.key, planned.index);
                match planned.dispatch {
                    Dispatch::Literal(child) => {
                        child.apply(&planned.key, child_input, walked, output)?;
                    }
                    Dispatch::Computed(candidates) => {
                        for child in candidates {
                            if child.apply(&planned.key, child_input, walked, output)? {
                                break;
                            }
                        }
                    }
                }
            }
        }
        walked.pop();
        walked.increment_last_hash_count();
        Ok(true)
    }
}

impl Leaf {
    fn apply<'a>(
        &self,
        key: &str,
        input: Option<&'a Value>,
        walked: &mut WalkedPath<'a>,
        output: &mut Value,
    ) -> Result<bool, JoltError> {
        let Some(matched) = self.element.matches(key, walked)? else {
            return Ok(false);
        };
        let (data, real_child) = match &self.element {
            PathElement::Dollar(_) | PathElement::Hash(_) => {
                (Some(Value::String(matched.raw_key().to_string())), false)
            }
            PathElement::At => (input.cloned(), false),
            PathElement::Transpose(t) => match t.object_evaluate(walked)? {
                Some(found) => (Some(found.clone()), false),
                None => return Ok(false),
            },
            _ => (input.cloned(), true),
        };

        walked.push(input, matched)?;
        if let Some(data) = data {
            for writer in &self.writers {
                writer.write(data.clone(), output, walked)?;
            }
        }
        walked.pop();
        if real_child {
            walked.increment_last_hash_count();
        }
        Ok(real_child)
    }
}
