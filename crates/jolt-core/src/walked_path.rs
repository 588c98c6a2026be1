//! The per-call stack of matched levels used to resolve back-references.
//!
//! Every transform call allocates its own [`WalkedPath`]; frames borrow into
//! the input being walked (or a snapshot of it) and never outlive the call.

use serde_json::Value;

use crate::error::JoltError;
use crate::path::{PathAndGroupReference, PathReference};
use crate::pointer::build_path;

/// The result of a successful match: the full matched key plus any
/// wildcard captures. Sub-key 0 is always the full key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedElement {
    sub_keys: Vec<String>,
    hash_count: usize,
}

impl MatchedElement {
    pub fn new(raw_key: impl Into<String>) -> Self {
        Self {
            sub_keys: vec![raw_key.into()],
            hash_count: 0,
        }
    }

    /// A match carrying wildcard captures after the full key.
    pub fn with_captures(raw_key: impl Into<String>, captures: Vec<String>) -> Self {
        let mut sub_keys = Vec::with_capacity(captures.len() + 1);
        sub_keys.push(raw_key.into());
        sub_keys.extend(captures);
        Self {
            sub_keys,
            hash_count: 0,
        }
    }

    pub fn raw_key(&self) -> &str {
        &self.sub_keys[0]
    }

    pub fn sub_key(&self, group: usize) -> Option<&str> {
        self.sub_keys.get(group).map(String::as_str)
    }

    pub fn sub_key_count(&self) -> usize {
        self.sub_keys.len()
    }

    /// How many children of this level have matched so far (`[#n]`).
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    pub fn increment_hash_count(&mut self) {
        self.hash_count += 1;
    }
}

/// One walked level.
#[derive(Debug, Clone)]
pub struct PathStep<'a> {
    tree: Option<&'a Value>,
    matched: MatchedElement,
    orig_size: Option<usize>,
}

impl<'a> PathStep<'a> {
    /// The input node at this level, if there was one.
    pub fn tree(&self) -> Option<&'a Value> {
        self.tree
    }

    pub fn matched(&self) -> &MatchedElement {
        &self.matched
    }

    /// Length of the array at this level before any writes grew it.
    pub fn orig_size(&self) -> Option<usize> {
        self.orig_size
    }
}

#[derive(Debug, Clone)]
pub struct WalkedPath<'a> {
    steps: Vec<PathStep<'a>>,
    max_depth: usize,
}

impl<'a> WalkedPath<'a> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            steps: Vec::with_capacity(16),
            max_depth,
        }
    }

    /// Pushes a level; an array `tree` records its current length as the
    /// original size.
    pub fn push(&mut self, tree: Option<&'a Value>, matched: MatchedElement) -> Result<(), JoltError> {
        let orig_size = tree.and_then(Value::as_array).map(Vec::len);
        self.push_with_size(tree, matched, orig_size)
    }

    pub fn push_with_size(
        &mut self,
        tree: Option<&'a Value>,
        matched: MatchedElement,
        orig_size: Option<usize>,
    ) -> Result<(), JoltError> {
        if self.steps.len() >= self.max_depth {
            return Err(JoltError::RecursionDepthExceeded {
                path: self.pointer(),
                max_depth: self.max_depth,
            });
        }
        self.steps.push(PathStep {
            tree,
            matched,
            orig_size,
        });
        Ok(())
    }

    pub fn pop(&mut self) -> Option<PathStep<'a>> {
        self.steps.pop()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&PathStep<'a>> {
        self.steps.last()
    }

    /// The frame `index` levels up from the current one (0 = current).
    pub fn element_from_end(&self, index: usize) -> Option<&PathStep<'a>> {
        self.steps.len().checked_sub(index + 1).map(|i| &self.steps[i])
    }

    /// Bumps the match counter of the current level.
    pub fn increment_last_hash_count(&mut self) {
        if let Some(step) = self.steps.last_mut() {
            step.matched.increment_hash_count();
        }
    }

    /// Resolves `&(p,k)` style references.
    pub fn resolve(&self, reference: &PathAndGroupReference, token: char) -> Result<&str, JoltError> {
        self.element_from_end(reference.path_index)
            .and_then(|step| step.matched.sub_key(reference.key_group))
            .ok_or_else(|| self.out_of_range(reference.canonical(token), reference.path_index))
    }

    /// Resolves `#n` style references to the match counter `n` levels up.
    pub fn hash_count(&self, reference: &PathReference) -> Result<usize, JoltError> {
        self.element_from_end(reference.path_index)
            .map(|step| step.matched.hash_count())
            .ok_or_else(|| self.out_of_range(reference.canonical('#'), reference.path_index))
    }

    fn out_of_range(&self, reference: String, path_index: usize) -> JoltError {
        JoltError::ReferenceOutOfRange {
            reference,
            depth: self.steps.len(),
            groups: self
                .element_from_end(path_index)
                .map_or(0, |step| step.matched.sub_key_count()),
        }
    }

    /// The walked keys as a `#/...` pointer, for error messages.
    pub fn pointer(&self) -> String {
        let keys: Vec<&str> = self.steps.iter().map(|s| s.matched.raw_key()).collect();
        build_path("#", &keys)
    }
}
