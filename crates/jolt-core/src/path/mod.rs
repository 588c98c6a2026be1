//! The path-element grammar.
//!
//! A spec key such as `tuna-*-marlin-*` or an output path such as
//! `&(1,2).&.value` is made of dot-separated segments; each segment parses
//! into one [`PathElement`]. Keys match input keys, output paths evaluate to
//! concrete keys against the [`WalkedPath`](crate::WalkedPath).

mod element;
mod evaluating;
mod lexer;
mod reference;
mod star;
mod transpose;

use thiserror::Error;

use crate::error::JoltError;

pub use element::{parse_key, AmpElement, ArrayIndex, PathElement};
pub use evaluating::{EvaluatingPath, PathReader, PathWriter};
pub use lexer::split_dot_notation;
pub use reference::{PathAndGroupReference, PathReference};
pub use star::{StarDouble, StarRegex, StarSingle};
pub use transpose::TransposeElement;

pub(crate) use element::{compare_computed, ElementClass};
pub(crate) use lexer::split_or;
pub(crate) use transpose::scalar_key;

/// A key or path that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid key '{key}': {message}")]
pub struct GrammarError {
    key: String,
    message: String,
}

impl GrammarError {
    pub(crate) fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Locates this error at `spec_path` inside the spec document.
    pub(crate) fn at(self, spec_path: &str) -> JoltError {
        JoltError::spec(spec_path, self.to_string())
    }
}
