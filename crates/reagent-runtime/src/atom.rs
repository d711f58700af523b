//! Atom abstraction.
//!
//! An atom is the smallest executable unit: an op code, an optional input
//! schema validated before dispatch, an advisory output schema, a per-dispatch
//! timeout, and an async exec procedure that may mutate the run context.

use crate::context::RuntimeContext;
use async_trait::async_trait;
use reagent_core::{JsonSchema, Step, Value, VmError, VmResult};

/// Static description of an atom.
#[derive(Debug)]
pub struct AtomSpec {
    op: String,
    docs: String,
    timeout_ms: u64,
    input_schema: Option<JsonSchema>,
    output_schema: Option<serde_json::Value>,
}

impl AtomSpec {
    /// Creates a spec with no schemas and no timeout. A zero timeout means
    /// unbounded execution; flow atoms use it so their children's own
    /// timeouts apply.
    pub fn new(op: impl Into<String>, docs: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            docs: docs.into(),
            timeout_ms: 0,
            input_schema: None,
            output_schema: None,
        }
    }

    /// Sets the per-dispatch timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Compiles and attaches the input schema.
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> VmResult<Self> {
        let compiled = JsonSchema::from_value(schema).map_err(|e| VmError::Validation {
            op: self.op.clone(),
            detail: format!("invalid input schema: {e}"),
        })?;
        self.input_schema = Some(compiled);
        Ok(self)
    }

    /// Attaches an advisory output schema. Not enforced at runtime.
    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn docs(&self) -> &str {
        &self.docs
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn input_schema(&self) -> Option<&JsonSchema> {
        self.input_schema.as_ref()
    }

    pub fn output_schema(&self) -> Option<&serde_json::Value> {
        self.output_schema.as_ref()
    }
}

/// The uniform execution interface every atom implements.
///
/// `exec` returns `Some(value)` when the atom produced a result; the executor
/// binds it into scope when the step carries a `result` name. Flow atoms
/// return `None` and act through the context instead.
#[async_trait]
pub trait Atom: Send + Sync {
    /// Static description: op code, docs, timeout, schemas.
    fn spec(&self) -> &AtomSpec;

    /// Executes one step.
    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>>;
}
