//! Error types for spec construction and transform execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract; the CLI and any embedding service key off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error (malformed spec, input or context document).
    JsonParseError,
    /// The spec is structurally invalid or uses invalid path grammar.
    SpecError,
    /// A modifier spec calls a function that is not registered.
    UnknownFunction,
    /// A valid spec was used incorrectly (bad chain subrange, impossible root shape).
    TransformError,
    /// A `&`, `$` or `#` reference points past the walked path or its captured groups.
    ReferenceOutOfRange,
    /// Spec nesting or walk depth exceeded `TransformOptions::max_depth`.
    RecursionDepthExceeded,
}

#[derive(Debug, Error)]
pub enum JoltError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Spec error at {path}: {message}")]
    SpecError { path: String, message: String },

    #[error("Unknown function '{name}' at {path}")]
    UnknownFunction { path: String, name: String },

    #[error("Transform error: {0}")]
    TransformError(String),

    #[error("Reference {reference} out of range (walked depth {depth}, captured groups {groups})")]
    ReferenceOutOfRange {
        reference: String,
        depth: usize,
        groups: usize,
    },

    #[error("Recursion depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },
}

impl JoltError {
    pub(crate) fn spec(path: impl Into<String>, message: impl Into<String>) -> Self {
        JoltError::SpecError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            JoltError::JsonError(_) => ErrorCode::JsonParseError,
            JoltError::SpecError { .. } => ErrorCode::SpecError,
            JoltError::UnknownFunction { .. } => ErrorCode::UnknownFunction,
            JoltError::TransformError(_) => ErrorCode::TransformError,
            JoltError::ReferenceOutOfRange { .. } => ErrorCode::ReferenceOutOfRange,
            JoltError::RecursionDepthExceeded { .. } => ErrorCode::RecursionDepthExceeded,
        }
    }

    /// Returns the spec path context, if available.
    ///
    /// Returns `None` for `JsonError`, `TransformError` and `ReferenceOutOfRange`.
    pub fn path(&self) -> Option<&str> {
        match self {
            JoltError::SpecError { path, .. } => Some(path),
            JoltError::UnknownFunction { path, .. } => Some(path),
            JoltError::RecursionDepthExceeded { path, .. } => Some(path),
            JoltError::JsonError(_)
            | JoltError::TransformError(_)
            | JoltError::ReferenceOutOfRange { .. } => None,
        }
    }

    /// True for errors raised while building a transform from its spec,
    /// before any input was looked at.
    pub fn is_spec_error(&self) -> bool {
        matches!(
            self,
            JoltError::JsonError(_) | JoltError::SpecError { .. } | JoltError::UnknownFunction { .. }
        )
    }

    /// Re-roots a spec-located error under `prefix`.
    ///
    /// Spec paths are built relative to the spec a transform was given
    /// (`#/rating/*`); the chain nests each stage's spec at `#/<index>/spec`.
    pub(crate) fn within(self, prefix: &str) -> Self {
        let reroot = |path: String| match path.strip_prefix('#') {
            Some(rest) => format!("{prefix}{rest}"),
            None => format!("{prefix}/{path}"),
        };
        match self {
            JoltError::SpecError { path, message } => JoltError::SpecError {
                path: reroot(path),
                message,
            },
            JoltError::UnknownFunction { path, name } => JoltError::UnknownFunction {
                path: reroot(path),
                name,
            },
            JoltError::RecursionDepthExceeded { path, max_depth } => {
                JoltError::RecursionDepthExceeded {
                    path: reroot(path),
                    max_depth,
                }
            }
            other => other,
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "path": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
