//! Path-driven get/set/remove over JSON trees.
//!
//! A [`Traversr`] is compiled once from the canonical segments of a path and
//! then reused for every concrete key list with the same shape: `a.[0].[]`
//! becomes a map step, then an explicit-array step, then an auto-expanding
//! array step. What happens at missing intermediates and at the final write
//! is decided by a [`TraversalPolicy`].

mod policy;
mod step;

use serde_json::Value;

use crate::error::JoltError;

pub use policy::{ShiftrPolicy, SimplePolicy, TraversalPolicy};
pub use step::{StepKind, TraversalStep, MAX_ARRAY_INDEX};
pub(crate) use step::grow_to;

/// Which mutating walk a policy is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOp {
    Set,
    Remove,
}

#[derive(Debug, Clone)]
pub struct Traversr<P: TraversalPolicy = SimplePolicy> {
    root: Option<Box<TraversalStep>>,
    len: usize,
    policy: P,
}

impl<P: TraversalPolicy> Traversr<P> {
    /// Builds the step chain right to left from canonical path segments.
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut root: Option<Box<TraversalStep>> = None;
        for segment in segments.iter().rev() {
            root = Some(Box::new(TraversalStep::new(
                StepKind::classify(segment.as_ref()),
                root,
            )));
        }
        Self {
            root,
            len: segments.len(),
            policy: P::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the value at `keys`. An empty traversr returns `tree` itself.
    pub fn get<'t>(&self, tree: &'t Value, keys: &[String]) -> Result<Option<&'t Value>, JoltError> {
        self.check_len(keys)?;
        Ok(match &self.root {
            Some(step) => get(step, tree, keys),
            None => Some(tree),
        })
    }

    /// Writes `data` at `keys`, creating intermediates as the policy allows.
    /// Returns whether anything was written.
    pub fn set(&self, tree: &mut Value, keys: &[String], data: Value) -> Result<bool, JoltError> {
        self.check_len(keys)?;
        Ok(match &self.root {
            Some(step) => set(step, tree, keys, data, &self.policy),
            None => false,
        })
    }

    /// Removes and returns the value at `keys`.
    pub fn remove(&self, tree: &mut Value, keys: &[String]) -> Result<Option<Value>, JoltError> {
        self.check_len(keys)?;
        Ok(match &self.root {
            Some(step) => remove(step, tree, keys, &self.policy),
            None => None,
        })
    }

    fn check_len(&self, keys: &[String]) -> Result<(), JoltError> {
        if keys.len() != self.len {
            return Err(JoltError::TransformError(format!(
                "traversal expects {} keys but got {}: {:?}",
                self.len,
                keys.len(),
                keys
            )));
        }
        Ok(())
    }
}

fn get<'t>(step: &TraversalStep, tree: &'t Value, keys: &[String]) -> Option<&'t Value> {
    if !step.accepts(tree) {
        return None;
    }
    let (key, rest) = keys.split_first()?;
    let sub = step.get(tree, key)?;
    match step.child() {
        Some(child) => get(child, sub, rest),
        None => Some(sub),
    }
}

fn set<P: TraversalPolicy>(
    step: &TraversalStep,
    tree: &mut Value,
    keys: &[String],
    data: Value,
    policy: &P,
) -> bool {
    if !step.accepts(tree) {
        tracing::trace!(kind = ?step.kind(), "container shape mismatch, skipping write");
        return false;
    }
    let Some((key, rest)) = keys.split_first() else {
        return false;
    };
    match step.child() {
        None => policy.handle_final_set(step, tree, key, data),
        Some(child) => match policy.handle_intermediate_get(step, tree, key, TraversalOp::Set) {
            Some(sub) => set(child, sub, rest, data, policy),
            None => false,
        },
    }
}

fn remove<P: TraversalPolicy>(
    step: &TraversalStep,
    tree: &mut Value,
    keys: &[String],
    policy: &P,
) -> Option<Value> {
    if !step.accepts(tree) {
        return None;
    }
    let (key, rest) = keys.split_first()?;
    match step.child() {
        None => step.remove(tree, key),
        Some(child) => {
            let sub = policy.handle_intermediate_get(step, tree, key, TraversalOp::Remove)?;
            remove(child, sub, rest, policy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_creates_intermediates() {
        let traversr: Traversr = Traversr::new(&["a", "[1]", "b"]);
        let mut tree = json!({});
        assert!(traversr.set(&mut tree, &keys(&["a", "1", "b"]), json!(5)).unwrap());
        assert_eq!(tree, json!({"a": [null, {"b": 5}]}));
    }

    #[test]
    fn test_set_auto_expand_appends() {
        let traversr: Traversr = Traversr::new(&["list", "[]"]);
        let mut tree = json!({});
        traversr.set(&mut tree, &keys(&["list", "[]"]), json!(1)).unwrap();
        traversr.set(&mut tree, &keys(&["list", "[]"]), json!(2)).unwrap();
        assert_eq!(tree, json!({"list": [1, 2]}));
    }

    #[test]
    fn test_get_and_remove() {
        let traversr: Traversr = Traversr::new(&["a", "[0]"]);
        let mut tree = json!({"a": ["x", "y"]});
        assert_eq!(
            traversr.get(&tree, &keys(&["a", "1"])).unwrap(),
            Some(&json!("y"))
        );
        assert_eq!(
            traversr.remove(&mut tree, &keys(&["a", "0"])).unwrap(),
            Some(json!("x"))
        );
        assert_eq!(tree, json!({"a": ["y"]}));
        assert_eq!(traversr.get(&tree, &keys(&["a", "5"])).unwrap(), None);
    }

    #[test]
    fn test_shape_mismatch_is_soft() {
        let traversr: Traversr = Traversr::new(&["a", "[0]"]);
        let mut tree = json!({"a": {"not": "a list"}});
        assert!(!traversr.set(&mut tree, &keys(&["a", "0"]), json!(1)).unwrap());
        assert_eq!(tree, json!({"a": {"not": "a list"}}));
        assert_eq!(traversr.get(&tree, &keys(&["a", "0"])).unwrap(), None);
    }

    #[test]
    fn test_key_count_mismatch_is_error() {
        let traversr: Traversr = Traversr::new(&["a", "b"]);
        let err = traversr.get(&json!({}), &keys(&["a"])).unwrap_err();
        assert!(matches!(err, JoltError::TransformError(_)));
    }

    #[test]
    fn test_empty_traversr_reads_tree() {
        let traversr: Traversr = Traversr::new::<&str>(&[]);
        let tree = json!({"a": 1});
        assert_eq!(traversr.get(&tree, &[]).unwrap(), Some(&tree));
        assert!(traversr.is_empty());
    }

    #[test]
    fn test_shiftr_policy_collects_collisions() {
        let traversr: Traversr<ShiftrPolicy> = Traversr::new(&["out"]);
        let mut tree = json!({});
        traversr.set(&mut tree, &keys(&["out"]), json!(1)).unwrap();
        traversr.set(&mut tree, &keys(&["out"]), json!(2)).unwrap();
        traversr.set(&mut tree, &keys(&["out"]), json!(3)).unwrap();
        assert_eq!(tree, json!({"out": [1, 2, 3]}));
    }
}
