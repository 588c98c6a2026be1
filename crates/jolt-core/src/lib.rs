//! # jolt-core
//!
//! JSON-to-JSON transformation driven by JSON specs.
//!
//! A spec mirrors the shape of the data it applies to. Each transform
//! ([`Shiftr`], [`Defaultr`], [`Removr`], [`CardinalityTransform`],
//! [`Filtr`], [`Modifier`], [`Sortr`]) compiles its spec once; a [`Chainr`]
//! runs a list of them in order.
//!
//! ```
//! use serde_json::json;
//!
//! let chain = json!([
//!     {"operation": "shift", "spec": {"rating": {"primary": {"value": "Rating"}}}},
//!     {"operation": "default", "spec": {"Range": 5}}
//! ]);
//! let out = jolt_core::transform(&chain, json!({"rating": {"primary": {"value": 3}}})).unwrap();
//! assert_eq!(out, json!({"Rating": 3, "Range": 5}));
//! ```

pub mod chainr;
pub mod config;
pub mod error;
pub mod functions;
pub mod path;
pub mod pointer;
mod spec;
pub mod transforms;
pub mod traversr;
pub mod walked_path;

pub use chainr::{transform, Chainr, ChainrBuilder, StageSpec};
pub use config::{Operation, TransformOptions};
pub use error::{ErrorCode, JoltError};
pub use functions::{Function, FunctionRegistry};
pub use spec::ExecutionStrategy;
pub use transforms::{
    CardinalityTransform, Defaultr, Filtr, Modifier, OpMode, Removr, Shiftr, Sortr, Transform,
};
pub use walked_path::{MatchedElement, WalkedPath};
