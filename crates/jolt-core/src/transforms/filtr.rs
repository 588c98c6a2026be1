//! Filtr: keep only the elements that satisfy a predicate set.
//!
//! The spec walks down to the container being filtered; the node for its
//! elements is an object of `field: pattern` pairs:
//!
//! ```json
//! { "books": { "*": { "genre": "fantasy|horror", "author.name": ["Le Guin", "Wolfe"] } } }
//! ```
//!
//! An element survives when at least one pair matches. String patterns are
//! anchored regexes, arrays match any member, anything else compares by
//! JSON equality.

use regex::Regex;
use serde_json::Value;

use crate::config::TransformOptions;
use crate::error::JoltError;
use crate::path::{scalar_key, PathElement, PathReader};
use crate::pointer::child_path;
use crate::spec::{
    check_depth, child_of, child_of_mut, parse_lhs, remove_children, require_object, ChildSpecs,
    Dispatch, SpecNode,
};
use crate::walked_path::{MatchedElement, WalkedPath};

use super::{unwrap_root, walk_depth, wrap_root, Transform, ROOT_KEY};

#[derive(Debug)]
pub struct Filtr {
    children: ChildSpecs<FiltrNode>,
    max_walk: usize,
}

#[derive(Debug)]
enum FiltrNode {
    Composite {
        element: PathElement,
        children: ChildSpecs<FiltrNode>,
    },
    Leaf {
        element: PathElement,
        predicates: Vec<FieldPredicate>,
    },
}

impl SpecNode for FiltrNode {
    fn path_element(&self) -> &PathElement {
        match self {
            FiltrNode::Composite { element, .. } | FiltrNode::Leaf { element, .. } => element,
        }
    }
}

#[derive(Debug)]
struct FieldPredicate {
    reader: PathReader,
    pattern: Pattern,
}

#[derive(Debug)]
enum Pattern {
    Regex(Regex),
    Equals(Value),
    AnyOf(Vec<Pattern>),
}

impl Pattern {
    fn compile(raw: &Value, spec_path: &str) -> Result<Self, JoltError> {
        match raw {
            Value::String(source) => Regex::new(&format!("^(?:{source})$"))
                .map(Pattern::Regex)
                .map_err(|e| JoltError::spec(spec_path, format!("invalid pattern '{source}': {e}"))),
            Value::Array(members) => members
                .iter()
                .map(|m| Pattern::compile(m, spec_path))
                .collect::<Result<Vec<_>, _>>()
                .map(Pattern::AnyOf),
            other => Ok(Pattern::Equals(other.clone())),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Pattern::Regex(re) => match value {
                Value::String(s) => re.is_match(s),
                Value::Number(_) | Value::Bool(_) => scalar_key(value).is_some_and(|s| re.is_match(&s)),
                _ => false,
            },
            Pattern::Equals(expected) => expected == value,
            Pattern::AnyOf(patterns) => patterns.iter().any(|p| p.matches(value)),
        }
    }
}

/// What a child did with the key it was offered.
enum Verdict {
    NoMatch,
    Keep,
    Drop,
}

impl Filtr {
    pub fn new(spec: &Value) -> Result<Self, JoltError> {
        Self::with_options(spec, &TransformOptions::default())
    }

    pub fn with_options(spec: &Value, options: &TransformOptions) -> Result<Self, JoltError> {
        if is_predicate_set(spec) {
            return Err(JoltError::spec(
                "#",
                "the top level of a filter spec must describe where the elements are, not a predicate set",
            ));
        }
        let children = build_children(spec, "#", 1, options)?;
        tracing::debug!(strategy = ?children.strategy(), "built filter spec");
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
            filter(&self.children, node, &mut walked)?;
        }
        Ok(unwrap_root(wrapper))
    }
}

impl Transform for Filtr {
    fn transform(&self, input: Value, _context: &Value) -> Result<Value, JoltError> {
        self.apply(input)
    }
}

/// A non-empty object with no object values.
fn is_predicate_set(spec: &Value) -> bool {
    match spec {
        Value::Object(map) => !map.is_empty() && map.values().all(|v| !v.is_object()),
        _ => false,
    }
}

fn build_children(
    spec: &Value,
    spec_path: &str,
    depth: usize,
    options: &TransformOptions,
) -> Result<ChildSpecs<FiltrNode>, JoltError> {
    check_depth(depth, options.max_depth, spec_path)?;
    let map = require_object(spec, spec_path, "filter")?;
    let mut children = Vec::with_capacity(map.len());
    for (key, value) in map {
        let path = child_path(spec_path, key);
        if !value.is_object() {
            return Err(JoltError::spec(
                &path,
                "filter values must be objects; predicates belong one level down",
            ));
        }
        let is_leaf = is_predicate_set(value);
        if !is_leaf && value.as_object().is_some_and(|m| m.values().any(|v| !v.is_object())) {
            return Err(JoltError::spec(
                &path,
                "a filter node can not mix predicates and nested nodes",
            ));
        }
        for element in parse_lhs(key, &path)? {
            if !matches!(
                element,
                PathElement::Literal(_)
                    | PathElement::StarAll
                    | PathElement::StarSingle(_)
                    | PathElement::StarDouble(_)
                    | PathElement::StarRegex(_)
            ) {
                return Err(JoltError::spec(&path, "filter keys must be literals or '*' wildcards"));
            }
            let node = if is_leaf {
                FiltrNode::Leaf {
                    element,
                    predicates: build_predicates(value, &path)?,
                }
            } else {
                FiltrNode::Composite {
                    element,
                    children: build_children(value, &path, depth + 1, options)?,
                }
            };
            children.push(node);
        }
    }
    ChildSpecs::new(children, spec_path)
}

fn build_predicates(spec: &Value, spec_path: &str) -> Result<Vec<FieldPredicate>, JoltError> {
    let map = require_object(spec, spec_path, "filter")?;
    map.iter()
        .map(|(field, pattern)| {
            let path = child_path(spec_path, field);
            Ok(FieldPredicate {
                reader: PathReader::parse(field).map_err(|e| e.at(&path))?,
                pattern: Pattern::compile(pattern, &path)?,
            })
        })
        .collect()
}

impl FiltrNode {
    fn apply(
        &self,
        parent: &mut Value,
        key: &str,
        index: Option<usize>,
        walked: &mut WalkedPath<'_>,
    ) -> Result<Verdict, JoltError> {
        let Some(matched) = self.path_element().matches(key, walked)? else {
            return Ok(Verdict::NoMatch);
        };
        walked.push(None, matched)?;
        let verdict = match self {
            FiltrNode::Composite { children, .. } => {
                if let Some(node) = child_of_mut(parent, key, index) {
                    filter(children, node, walked)?;
                }
                Verdict::Keep
            }
            FiltrNode::Leaf { predicates, .. } => {
                let keep = match child_of(parent, key, index) {
                    Some(candidate) => any_predicate(predicates, candidate, walked)?,
                    None => true,
                };
                if keep {
                    Verdict::Keep
                } else {
                    tracing::trace!(key, "element failed every predicate");
                    Verdict::Drop
                }
            }
        };
        walked.pop();
        Ok(verdict)
    }
}

fn any_predicate(
    predicates: &[FieldPredicate],
    candidate: &Value,
    walked: &WalkedPath<'_>,
) -> Result<bool, JoltError> {
    for predicate in predicates {
        if let Some(field) = predicate.reader.read(candidate, walked)? {
            if predicate.pattern.matches(field) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Scans `node` with `children`, then removes the elements that failed.
fn filter(
    children: &ChildSpecs<FiltrNode>,
    node: &mut Value,
    walked: &mut WalkedPath<'_>,
) -> Result<(), JoltError> {
    if !node.is_object() && !node.is_array() {
        return Ok(());
    }
    let mut doomed = Vec::new();
    for planned in children.plan(node, false) {
        let candidates: &[FiltrNode] = match planned.dispatch {
            Dispatch::Literal(child) => std::slice::from_ref(child),
            Dispatch::Computed(computed) => computed,
        };
        for child in candidates {
            match child.apply(node, &planned.key, planned.index, walked)? {
                Verdict::NoMatch => continue,
                Verdict::Keep => {}
                Verdict::Drop => doomed.push((planned.key.clone(), planned.index)),
            }
            break;
        }
    }
    remove_children(node, &doomed)
}
