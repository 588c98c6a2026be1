//! Chainr: an ordered list of transform stages.
//!
//! ```json
//! [
//!   { "operation": "shift", "spec": { "rating": "Rating" } },
//!   { "operation": "default", "spec": { "Rating": 0 } }
//! ]
//! ```
//!
//! Every stage is compiled up front; a chain that builds never fails on a
//! spec error later. Each stage receives the previous stage's output and
//! the shared context document.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{Operation, TransformOptions};
use crate::error::JoltError;
use crate::functions::{Function, FunctionRegistry};
use crate::transforms::{
    CardinalityTransform, Defaultr, Filtr, Modifier, OpMode, Removr, Shiftr, Sortr, Transform,
};

/// One entry of a chain spec.
#[derive(Debug, Clone, Deserialize)]
pub struct StageSpec {
    pub operation: Operation,
    #[serde(default)]
    pub spec: Value,
}

#[derive(Debug, Clone)]
struct Stage {
    operation: Operation,
    transform: Arc<dyn Transform>,
}

/// A compiled chain. Cheap to share: stages are immutable.
#[derive(Debug, Clone)]
pub struct Chainr {
    stages: Vec<Stage>,
}

/// Configures how a [`Chainr`] is compiled.
#[derive(Debug, Default)]
pub struct ChainrBuilder {
    options: TransformOptions,
    functions: FunctionRegistry,
}

impl ChainrBuilder {
    pub fn options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a function for the modifier stages, replacing any built-in
    /// of the same name.
    pub fn function(mut self, name: impl Into<String>, function: impl Function + 'static) -> Self {
        self.functions.register(name, function);
        self
    }

    pub fn build(&self, chain_spec: &Value) -> Result<Chainr, JoltError> {
        let stage_specs = parse_stages(chain_spec)?;
        let mut stages = Vec::with_capacity(stage_specs.len());
        for (i, stage) in stage_specs.into_iter().enumerate() {
            let transform = self
                .compile(&stage)
                .map_err(|e| e.within(&format!("#/{i}/spec")))?;
            tracing::debug!(stage = i, operation = %stage.operation, "compiled chain stage");
            stages.push(Stage {
                operation: stage.operation,
                transform,
            });
        }
        Ok(Chainr { stages })
    }

    fn compile(&self, stage: &StageSpec) -> Result<Arc<dyn Transform>, JoltError> {
        let spec = &stage.spec;
        let options = &self.options;
        let modifier = |mode: OpMode| Modifier::with_options(spec, mode, options, &self.functions);
        Ok(match stage.operation {
            Operation::Shift => Arc::new(Shiftr::with_options(spec, options)?),
            Operation::Default => Arc::new(Defaultr::with_options(spec, options)?),
            Operation::Remove => Arc::new(Removr::with_options(spec, options)?),
            Operation::Cardinality => Arc::new(CardinalityTransform::with_options(spec, options)?),
            Operation::Filtr => Arc::new(Filtr::with_options(spec, options)?),
            Operation::Sort => Arc::new(Sortr::new(spec)?),
            Operation::ModifyOverwriteBeta => Arc::new(modifier(OpMode::Overwrite)?),
            Operation::ModifyDefaultBeta => Arc::new(modifier(OpMode::Default)?),
            Operation::ModifyDefineBeta => Arc::new(modifier(OpMode::Define)?),
        })
    }
}

/// A chain spec is an array of stages; a lone stage object is a chain of one.
fn parse_stages(chain_spec: &Value) -> Result<Vec<StageSpec>, JoltError> {
    let entries: Vec<&Value> = match chain_spec {
        Value::Array(list) => list.iter().collect(),
        Value::Object(_) => vec![chain_spec],
        _ => {
            return Err(JoltError::spec(
                "#",
                "a chain spec must be an array of {\"operation\", \"spec\"} objects",
            ))
        }
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            StageSpec::deserialize(entry).map_err(|e| JoltError::spec(format!("#/{i}"), e.to_string()))
        })
        .collect()
}

impl Chainr {
    /// Compiles `chain_spec` with default options and the built-in functions.
    pub fn from_spec(chain_spec: &Value) -> Result<Self, JoltError> {
        Self::builder().build(chain_spec)
    }

    pub fn builder() -> ChainrBuilder {
        ChainrBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The operation of every stage, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.stages.iter().map(|s| s.operation).collect()
    }

    pub fn transform(&self, input: Value) -> Result<Value, JoltError> {
        self.transform_with_context(input, &Value::Object(Map::new()))
    }

    pub fn transform_with_context(&self, input: Value, context: &Value) -> Result<Value, JoltError> {
        self.transform_range(0, self.stages.len(), input, context)
    }

    /// Runs stages `from..to` only.
    pub fn transform_range(&self, from: usize, to: usize, input: Value, context: &Value) -> Result<Value, JoltError> {
        if from > to || to > self.stages.len() {
            return Err(JoltError::TransformError(format!(
                "invalid stage range {from}..{to} for a chain of {} stages",
                self.stages.len()
            )));
        }
        let mut value = input;
        for (i, stage) in self.stages[from..to].iter().enumerate() {
            tracing::debug!(stage = from + i, operation = %stage.operation, "running chain stage");
            value = stage.transform.transform(value, context)?;
        }
        Ok(value)
    }
}

impl Transform for Chainr {
    fn transform(&self, input: Value, context: &Value) -> Result<Value, JoltError> {
        self.transform_with_context(input, context)
    }
}

/// Compiles `chain_spec` and runs it once against `input`.
pub fn transform(chain_spec: &Value, input: Value) -> Result<Value, JoltError> {
    Chainr::from_spec(chain_spec)?.transform(input)
}
