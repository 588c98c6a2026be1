//! Modifier: compute values in place.
//!
//! The spec mirrors the data. Leaves are value templates (see [`rhs`]);
//! whether a computed value is written is decided by the [`OpMode`]:
//!
//! ```json
//! { "name": "=toUpper", "full": "=concat(@(1,first),' ',@(1,last))", "tags": { "[0]": "new" } }
//! ```
//!
//! Lookups always read a snapshot of the input taken before the stage runs,
//! so earlier writes in the same stage are never observed by later lookups.

mod rhs;

use serde_json::{Map, Value};

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::functions::FunctionRegistry;
use crate::path::{ArrayIndex, PathElement};
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of, child_of_mut, json_type, parse_lhs, require_object, ChildSpecs, Dispatch,
    SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use self::rhs::ValueTemplate;
use super::{unwrap_root, walk_depth, wrap_root, OpMode, Transform, ROOT_KEY};

#[derive(Debug)]
pub struct Modifier {
    root: ModifierNode,
    mode: OpMode,
    max_walk: usize,
}

/// The container a composite creates when its slot is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Works on objects and arrays; creates an object.
    Runtime,
    /// Declared by `[n]` keys; works on and creates arrays.
    List,
}

impl Shape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Shape::Runtime => value.is_object() || value.is_array(),
            Shape::List => value.is_array(),
        }
    }

    fn empty(self) -> Value {
        match self {
            Shape::Runtime => Value::Object(Map::new()),
            Shape::List => Value::Array(Vec::new()),
        }
    }
}

#[derive(Debug)]
enum ModifierNode {
    Composite {
        element: PathElement,
        shape: Shape,
        children: ChildSpecs<ModifierNode>,
    },
    Leaf {
        element: PathElement,
        template: ValueTemplate,
    },
}

impl SpecNode for ModifierNode {
    fn path_element(&self) -> &PathElement {
        match self {
            ModifierNode::Composite { element, .. } | ModifierNode::Leaf { element, .. } => element,
        }
    }
}

/// Per-call state that does not change while walking.
struct Run<'c> {
    mode: OpMode,
    context: &'c Value,
}

struct Builder<'o> {
    options: &'o TransformOptions,
    functions: &'o FunctionRegistry,
}

impl Modifier {
    pub fn new(spec: &Value, mode: OpMode) -> Result<Self, JoltError> {
        Self::with_options(spec, mode, &TransformOptions::default(), &FunctionRegistry::with_builtins())
    }

    pub fn overwrite(spec: &Value) -> Result<Self, JoltError> {
        Self::new(spec, OpMode::Overwrite)
    }

    pub fn default(spec: &Value) -> Result<Self, JoltError> {
        Self::new(spec, OpMode::Default)
    }

    pub fn define(spec: &Value) -> Result<Self, JoltError> {
        Self::new(spec, OpMode::Define)
    }

    pub fn with_options(
        spec: &Value,
        mode: OpMode,
        options: &TransformOptions,
        functions: &FunctionRegistry,
    ) -> Result<Self, JoltError> {
        let builder = Builder { options, functions };
        let (shape, children) = builder.children(spec, "#", 1)?;
        tracing::debug!(?mode, strategy = ?children.strategy(), "built modify spec");
        Ok(Self {
            root: ModifierNode::Composite {
                element: PathElement::Literal(ROOT_KEY.to_string()),
                shape,
                children,
            },
            mode,
            max_walk: walk_depth(options),
        })
    }

    pub fn mode(&self) -> OpMode {
        self.mode
    }

    pub fn apply(&self, input: Value, context: &Value) -> Result<Value, JoltError> {
        let snapshot = wrap_root(input.clone());
        let mut output = wrap_root(input);
        let run = Run {
            mode: self.mode,
            context,
        };
        let mut walked = WalkedPath::new(self.max_walk);
        walked.push(Some(&snapshot), MatchedElement::new(ROOT_KEY))?;
        self.root
            .apply(&mut output, ROOT_KEY, None, Some(&snapshot), &mut walked, &run)?;
        Ok(unwrap_root(output))
    }
}

impl Transform for Modifier {
    fn transform(&self, input: Value, context: &Value) -> Result<Value, JoltError> {
        self.apply(input, context)
    }
}

impl Builder<'_> {
    fn children(
        &self,
        spec: &Value,
        spec_path: &str,
        depth: usize,
    ) -> Result<(Shape, ChildSpecs<ModifierNode>), JoltError> {
        check_depth(depth, self.options.max_depth, spec_path)?;
        let map = require_object(spec, spec_path, "modify")?;
        let mut shape = Shape::Runtime;
        let mut plain_literal: Option<String> = None;
        let mut children = Vec::with_capacity(map.len());

        for (key, value) in map {
            let path = child_path(spec_path, key);
            for element in parse_lhs(key, &path)? {
                let element = match element {
                    PathElement::ArrayIndex(ArrayIndex::Explicit(index)) => {
                        shape = Shape::List;
                        PathElement::Literal(index.to_string())
                    }
                    PathElement::Literal(raw) => {
                        plain_literal.get_or_insert_with(|| path.clone());
                        PathElement::Literal(raw)
                    }
                    star @ (PathElement::StarAll
                    | PathElement::StarSingle(_)
                    | PathElement::StarDouble(_)
                    | PathElement::StarRegex(_)) => star,
                    _ => {
                        return Err(JoltError::spec(
                            &path,
                            "modify keys must be literals, '*' wildcards or '[n]' indices",
                        ))
                    }
                };
                children.push(self.node(element, value, &path, depth)?);
            }
        }
        if shape == Shape::List {
            if let Some(path) = plain_literal {
                return Err(JoltError::spec(
                    path,
                    "a node with '[n]' keys works on an array; use '[n]' or '*' for its other keys",
                ));
            }
        }
        Ok((shape, ChildSpecs::new(children, spec_path)?))
    }

    fn node(&self, element: PathElement, value: &Value, spec_path: &str, depth: usize) -> Result<ModifierNode, JoltError> {
        if value.is_object() {
            let (shape, children) = self.children(value, spec_path, depth + 1)?;
            return Ok(ModifierNode::Composite {
                element,
                shape,
                children,
            });
        }
        Ok(ModifierNode::Leaf {
            element,
            template: ValueTemplate::parse(value, spec_path, self.functions)?,
        })
    }
}

impl ModifierNode {
    /// Applies this node to `parent[key]`. `snapshot_parent` is the same
    /// level in the untouched input, if it exists there.
    fn apply<'a>(
        &self,
        parent: &mut Value,
        key: &str,
        index: Option<usize>,
        snapshot_parent: Option<&'a Value>,
        walked: &mut WalkedPath<'a>,
        run: &Run<'_>,
    ) -> Result<bool, JoltError> {
        let Some(matched) = self.path_element().matches(key, walked)? else {
            return Ok(false);
        };
        let snapshot = snapshot_parent.and_then(|p| child_of(p, key, index));
        let parent_orig_size = walked.last().and_then(|step| step.orig_size());

        match self {
            ModifierNode::Leaf { template, .. } => {
                walked.push(snapshot, matched)?;
                let value = template.evaluate(child_of(parent, key, index), walked, run.context);
                walked.pop();
                if let Some(value) = value? {
                    if !run.mode.write(parent, key, index, value, parent_orig_size) {
                        tracing::trace!(key, mode = ?run.mode, "value kept, mode does not allow the write");
                    }
                }
            }
            ModifierNode::Composite { shape, children, .. } => {
                if child_of(parent, key, index).map_or(true, Value::is_null) {
                    run.mode.write(parent, key, index, shape.empty(), parent_orig_size);
                }
                let Some(node) = child_of_mut(parent, key, index) else {
                    return Ok(true);
                };
                if !shape.accepts(node) {
                    tracing::trace!(key, found = json_type(node), "existing value does not fit the spec, skipping");
                    return Ok(true);
                }
                let orig_size = snapshot.and_then(Value::as_array).map(Vec::len);
                walked.push_with_size(snapshot, matched, orig_size)?;
                let result = process(children, node, snapshot, walked, run);
                walked.pop();
                result?;
            }
        }
        Ok(true)
    }
}

fn process<'a>(
    children: &ChildSpecs<ModifierNode>,
    node: &mut Value,
    snapshot: Option<&'a Value>,
    walked: &mut WalkedPath<'a>,
    run: &Run<'_>,
) -> Result<(), JoltError> {
    for planned in children.plan(node, true) {
        match planned.dispatch {
            Dispatch::Literal(child) => {
                child.apply(node, &planned.key, planned.index, snapshot, walked, run)?;
            }
            Dispatch::Computed(candidates) => {
                for child in candidates {
                    if child.apply(node, &planned.key, planned.index, snapshot, walked, run)? {
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

    fn modify(mode: OpMode, spec: Value, input: Value) -> Value {
        Modifier::new(&spec, mode).unwrap().apply(input, &json!({})).unwrap()
    }

    #[test]
    fn test_overwrite_with_function() {
        let out = modify(
            OpMode::Overwrite,
            json!({"name": "=toUpper", "missing": "=toUpper"}),
            json!({"name": "ada"}),
        );
        assert_eq!(out, json!({"name": "ADA"}));
    }

    #[test]
    fn test_lookups_read_the_snapshot() {
        let out = modify(
            OpMode::Overwrite,
            json!({
                "first": "=toUpper",
                "full": "=concat(@(1,first), ' ', @(1,last))"
            }),
            json!({"first": "ada", "last": "lovelace"}),
        );
        assert_eq!(out, json!({"first": "ADA", "last": "lovelace", "full": "ada lovelace"}));
    }

    #[test]
    fn test_modes() {
        let spec = json!({"a": 1, "b": 2, "c": 3});
        let input = json!({"a": "x", "b": null});
        assert_eq!(modify(OpMode::Overwrite, spec.clone(), input.clone()), json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(modify(OpMode::Default, spec.clone(), input.clone()), json!({"a": "x", "b": 2, "c": 3}));
        assert_eq!(modify(OpMode::Define, spec, input), json!({"a": "x", "b": null, "c": 3}));
    }

    #[test]
    fn test_list_shape_and_indices() {
        let out = modify(OpMode::Overwrite, json!({"tags": {"[1]": "b"}}), json!({}));
        assert_eq!(out, json!({"tags": [null, "b"]}));

        let out = modify(OpMode::Define, json!({"tags": {"[0]": "x", "[2]": "z"}}), json!({"tags": ["a"]}));
        assert_eq!(out, json!({"tags": ["a", null, "z"]}));

        let out = modify(OpMode::Default, json!({"tags": {"[1]": "fill"}}), json!({"tags": ["a", null]}));
        assert_eq!(out, json!({"tags": ["a", "fill"]}));
    }

    #[test]
    fn test_star_over_arrays() {
        let out = modify(
            OpMode::Overwrite,
            json!({"people": {"*": {"name": "=toLower", "id": "=toString(@(1,id))"}}}),
            json!({"people": [{"name": "A", "id": 1}, {"name": "B", "id": 2}]}),
        );
        assert_eq!(
            out,
            json!({"people": [{"name": "a", "id": "1"}, {"name": "b", "id": "2"}]})
        );
    }

    #[test]
    fn test_context_lookup() {
        let modifier = Modifier::overwrite(&json!({"env": "^deploy.env"})).unwrap();
        let out = modifier.apply(json!({}), &json!({"deploy": {"env": "prod"}})).unwrap();
        assert_eq!(out, json!({"env": "prod"}));
    }

    #[test]
    fn test_shape_mismatch_is_skipped() {
        let out = modify(OpMode::Overwrite, json!({"a": {"b": 1}}), json!({"a": "scalar"}));
        assert_eq!(out, json!({"a": "scalar"}));
    }

    #[test]
    fn test_custom_function() {
        let mut functions = FunctionRegistry::empty();
        functions.register("double", |args: &[Value]| args.first()?.as_i64().map(|n| json!(n * 2)));
        let modifier =
            Modifier::with_options(&json!({"n": "=double"}), OpMode::Overwrite, &TransformOptions::default(), &functions)
                .unwrap();
        assert_eq!(modifier.apply(json!({"n": 21}), &json!({})).unwrap(), json!({"n": 42}));
    }

    #[test]
    fn test_invalid_specs() {
        let err = Modifier::overwrite(&json!({"a": {"b": "=nope"}})).unwrap_err();
        assert!(matches!(err, JoltError::UnknownFunction { .. }));
        assert_eq!(err.path(), Some("#/a/b"));
        assert!(Modifier::overwrite(&json!({"&1": "x"})).is_err());
        assert!(Modifier::overwrite(&json!({"a": {"[0]": 1, "b": 2}})).is_err());
        assert!(Modifier::overwrite(&json!({"a": {"[]": 1}})).is_err());
    }
}
