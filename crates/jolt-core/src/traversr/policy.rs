use std::fmt::Debug;

use serde_json::Value;

use super::step::TraversalStep;
use super::TraversalOp;

/// Decides what a [`Traversr`](super::Traversr) does at missing
/// intermediates and at the final segment of a write.
pub trait TraversalPolicy: Debug + Default + Send + Sync {
    /// Returns the container to descend into under `key`, creating it when
    /// the policy allows, or `None` to stop the walk.
    fn handle_intermediate_get<'t>(
        &self,
        step: &TraversalStep,
        tree: &'t mut Value,
        key: &str,
        op: TraversalOp,
    ) -> Option<&'t mut Value>;

    /// Stores `data` at the last segment. Returns whether it was written.
    fn handle_final_set(&self, step: &TraversalStep, tree: &mut Value, key: &str, data: Value) -> bool;
}

/// Creates missing (or null) intermediates on set and overwrites at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePolicy;

/// Like [`SimplePolicy`], but a write that lands on an existing value
/// collects both into a list instead of overwriting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftrPolicy;

fn descend_or_create<'t>(
    step: &TraversalStep,
    tree: &'t mut Value,
    key: &str,
    op: TraversalOp,
) -> Option<&'t mut Value> {
    let missing = step.get(tree, key).map_or(true, Value::is_null);
    if !missing {
        return step.get_mut(tree, key);
    }
    match (op, step.child()) {
        (TraversalOp::Set, Some(child)) => step.overwrite_set(tree, key, child.new_container()),
        _ => None,
    }
}

impl TraversalPolicy for SimplePolicy {
    fn handle_intermediate_get<'t>(
        &self,
        step: &TraversalStep,
        tree: &'t mut Value,
        key: &str,
        op: TraversalOp,
    ) -> Option<&'t mut Value> {
        descend_or_create(step, tree, key, op)
    }

    fn handle_final_set(&self, step: &TraversalStep, tree: &mut Value, key: &str, data: Value) -> bool {
        step.overwrite_set(tree, key, data).is_some()
    }
}

enum Slot {
    Empty,
    List,
    Occupied,
}

impl TraversalPolicy for ShiftrPolicy {
    fn handle_intermediate_get<'t>(
        &self,
        step: &TraversalStep,
        tree: &'t mut Value,
        key: &str,
        op: TraversalOp,
    ) -> Option<&'t mut Value> {
        descend_or_create(step, tree, key, op)
    }

    fn handle_final_set(&self, step: &TraversalStep, tree: &mut Value, key: &str, data: Value) -> bool {
        let slot = match step.get(tree, key) {
            None | Some(Value::Null) => Slot::Empty,
            Some(Value::Array(_)) => Slot::List,
            Some(_) => Slot::Occupied,
        };
        match slot {
            Slot::Empty => step.overwrite_set(tree, key, data).is_some(),
            Slot::List => match step.get_mut(tree, key) {
                Some(Value::Array(list)) => {
                    list.push(data);
                    true
                }
                _ => false,
            },
            Slot::Occupied => match step.get_mut(tree, key) {
                Some(existing) => {
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, data]);
                    true
                }
                None => false,
            },
        }
    }
}
