//! Picking how a composite node's children are matched against input keys.
//!
//! The choice is made once per node at build time and only depends on the
//! children's path elements.

use serde_json::Value;

use crate::path::{scalar_key, PathElement};

use super::{ChildSpecs, SpecNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Only literal children: look each one up directly.
    AllLiterals,
    /// Only computed children: scan every input key.
    Computed,
    /// Both, and no literal can match a computed sibling: run the literal
    /// lookups and the scan independently.
    AvailableLiteralsWithComputed,
    /// Both, with a possible overlap: per input key, a literal child wins,
    /// otherwise the first matching computed child.
    Conflict,
}

impl ExecutionStrategy {
    /// Overlap is only ruled out for the plain `*` forms. Regex and `&`
    /// siblings always count as a possible conflict.
    pub fn determine<'k>(
        literal_keys: impl IntoIterator<Item = &'k str>,
        computed: &[&PathElement],
    ) -> Self {
        let literal_keys: Vec<&str> = literal_keys.into_iter().collect();
        match (literal_keys.is_empty(), computed.is_empty()) {
            (true, true) | (false, true) => ExecutionStrategy::AllLiterals,
            (true, false) => ExecutionStrategy::Computed,
            (false, false) => {
                let disjoint = computed.iter().all(|element| {
                    element.is_simple_star()
                        && literal_keys.iter().all(|key| !element.string_matches(key))
                });
                if disjoint {
                    ExecutionStrategy::AvailableLiteralsWithComputed
                } else {
                    ExecutionStrategy::Conflict
                }
            }
        }
    }

    /// Lists which child handles which input key, in execution order.
    ///
    /// With `visit_absent`, literal children are also scheduled for keys the
    /// input does not have yet (transforms that create data).
    pub(crate) fn plan<'s, S: SpecNode>(
        self,
        children: &'s ChildSpecs<S>,
        input: &Value,
        visit_absent: bool,
    ) -> Vec<PlannedKey<'s, S>> {
        let mut plan = Vec::new();
        match self {
            ExecutionStrategy::AllLiterals => literal_pass(children, input, visit_absent, &mut plan),
            ExecutionStrategy::Computed => computed_pass(children, input, &mut plan),
            ExecutionStrategy::AvailableLiteralsWithComputed => {
                literal_pass(children, input, visit_absent, &mut plan);
                computed_pass(children, input, &mut plan);
            }
            ExecutionStrategy::Conflict => {
                for (key, index) in input_keys(input) {
                    let dispatch = match children.literal(&key) {
                        Some(child) => Dispatch::Literal(child),
                        None if children.computed().is_empty() => continue,
                        None => Dispatch::Computed(children.computed()),
                    };
                    plan.push(PlannedKey { key, index, dispatch });
                }
                if visit_absent {
                    for child in children.literals() {
                        let key = child.literal_key();
                        if let Some(index) = absent_slot(input, key) {
                            plan.push(PlannedKey {
                                key: key.to_string(),
                                index,
                                dispatch: Dispatch::Literal(child),
                            });
                        }
                    }
                }
            }
        }
        plan
    }
}

/// Which children to try for one input key.
#[derive(Debug)]
pub(crate) enum Dispatch<'s, S> {
    Literal(&'s S),
    /// Tried in priority order until one matches.
    Computed(&'s [S]),
}

#[derive(Debug)]
pub(crate) struct PlannedKey<'s, S> {
    pub key: String,
    /// Set when the input is an array.
    pub index: Option<usize>,
    pub dispatch: Dispatch<'s, S>,
}

fn literal_pass<'s, S: SpecNode>(
    children: &'s ChildSpecs<S>,
    input: &Value,
    visit_absent: bool,
    plan: &mut Vec<PlannedKey<'s, S>>,
) {
    for child in children.literals() {
        let key = child.literal_key();
        let slot = match input {
            Value::Object(map) => (map.contains_key(key) || visit_absent).then_some(None),
            Value::Array(list) => key
                .parse::<usize>()
                .ok()
                .filter(|&i| i < list.len() || visit_absent)
                .map(Some),
            Value::Null => None,
            scalar => scalar_key(scalar).filter(|s| s == key).map(|_| None),
        };
        if let Some(index) = slot {
            plan.push(PlannedKey {
                key: key.to_string(),
                index,
                dispatch: Dispatch::Literal(child),
            });
        }
    }
}

fn computed_pass<'s, S: SpecNode>(children: &'s ChildSpecs<S>, input: &Value, plan: &mut Vec<PlannedKey<'s, S>>) {
    if children.computed().is_empty() {
        return;
    }
    for (key, index) in input_keys(input) {
        plan.push(PlannedKey {
            key,
            index,
            dispatch: Dispatch::Computed(children.computed()),
        });
    }
}

/// Where an absent literal key would go: `Some(None)` for a map key,
/// `Some(Some(i))` for an array slot, `None` if present or impossible.
fn absent_slot(input: &Value, key: &str) -> Option<Option<usize>> {
    match input {
        Value::Object(map) => (!map.contains_key(key)).then_some(None),
        Value::Array(list) => key
            .parse::<usize>()
            .ok()
            .filter(|&i| i >= list.len())
            .map(Some),
        _ => None,
    }
}

/// The keys of an input node: object keys, array indices, or the scalar
/// itself as a string.
pub(crate) fn input_keys(input: &Value) -> Vec<(String, Option<usize>)> {
    match input {
        Value::Object(map) => map.keys().map(|k| (k.clone(), None)).collect(),
        Value::Array(list) => (0..list.len()).map(|i| (i.to_string(), Some(i))).collect(),
        Value::Null => Vec::new(),
        scalar => scalar_key(scalar).map(|s| (s, None)).into_iter().collect(),
    }
}
