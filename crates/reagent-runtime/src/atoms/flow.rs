//! Flow-control atoms: `seq`, `if`, `while`, `return`, `try`, `scope`.
//!
//! Flow atoms carry no timeout of their own so control structures can
//! enclose arbitrarily long child computations, and they cost no fuel; their
//! children do.

use super::expression_vars;
use crate::atom::{Atom, AtomSpec};
use crate::context::RuntimeContext;
use crate::executor;
use crate::expr;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmError, VmResult, object_properties};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry) -> VmResult<()> {
    registry.register(Arc::new(SeqAtom::new()?));
    registry.register(Arc::new(IfAtom::new()?));
    registry.register(Arc::new(WhileAtom::new()?));
    registry.register(Arc::new(ReturnAtom::new()?));
    registry.register(Arc::new(TryAtom::new()?));
    registry.register(Arc::new(ScopeAtom::new()?));
    Ok(())
}

/// Runs a step list as an inline sequence inside a fresh child scope.
async fn run_in_frame(steps: &[Step], ctx: &mut RuntimeContext) -> VmResult<()> {
    ctx.push_frame();
    let result = executor::run_sequence(steps, ctx).await;
    ctx.pop_frame();
    result
}

/// Dispatch each child step in order.
pub struct SeqAtom {
    spec: AtomSpec,
}

impl SeqAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("seq", "Execute child steps in order.").with_input_schema(json!({
                "type": "object",
                "properties": {
                    "steps": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["steps"]
            }))?,
        })
    }
}

#[async_trait]
impl Atom for SeqAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let steps = step.steps_field("steps")?;
        executor::run_sequence(&steps, ctx).await?;
        Ok(None)
    }
}

/// Evaluate a condition and run one of two branches in a child scope.
pub struct IfAtom {
    spec: AtomSpec,
}

impl IfAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "if",
                "Evaluate a condition expression; run 'then' when non-zero, 'else' otherwise.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "condition": {"type": "string"},
                    "vars": {"type": "object"},
                    "then": {"type": "array", "items": {"type": "object"}},
                    "else": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["condition", "then"]
            }))?,
        })
    }
}

#[async_trait]
impl Atom for IfAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let env = expression_vars(step, ctx)?;
        let condition = step.string_field("condition")?;
        let branch = if expr::evaluate(condition, &env)? != 0.0 {
            Some(step.steps_field("then")?)
        } else {
            step.opt_steps_field("else")?
        };

        if let Some(body) = branch {
            run_in_frame(&body, ctx).await?;
        }
        Ok(None)
    }
}

/// Repeat a body while a condition evaluates non-zero.
pub struct WhileAtom {
    spec: AtomSpec,
}

impl WhileAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "while",
                "Repeat the body while the condition expression is non-zero.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "condition": {"type": "string"},
                    "vars": {"type": "object"},
                    "body": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["condition", "body"]
            }))?,
        })
    }

    /// One frame spans the whole loop: the condition is evaluated inside it
    /// so body writes to loop counters are visible at the next check.
    async fn run_loop(step: &Step, body: &[Step], ctx: &mut RuntimeContext) -> VmResult<()> {
        let condition = step.string_field("condition")?;
        loop {
            if ctx.output.is_some() {
                return Ok(());
            }
            if ctx.fuel_exhausted() {
                return Err(VmError::OutOfFuel {
                    used: ctx.fuel_used(),
                });
            }
            let env = expression_vars(step, ctx)?;
            if expr::evaluate(condition, &env)? == 0.0 {
                return Ok(());
            }
            executor::run_sequence(body, ctx).await?;
        }
    }
}

#[async_trait]
impl Atom for WhileAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let body = step.steps_field("body")?;
        ctx.push_frame();
        let result = Self::run_loop(step, &body, ctx).await;
        ctx.pop_frame();
        result?;
        Ok(None)
    }
}

/// Assemble the output object and unwind the run.
pub struct ReturnAtom {
    spec: AtomSpec,
}

impl ReturnAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "return",
                "Build the output object from the schema's properties and end the run.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "schema": {"type": "object"}
                }
            }))?,
        })
    }
}

#[async_trait]
impl Atom for ReturnAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        // The schema is only read for its property names, never validated.
        let mut output = HashMap::new();
        if let Some(schema) = step.field("schema") {
            for name in object_properties(schema) {
                if let Some(value) = ctx.get(&name) {
                    output.insert(name, value.clone());
                }
            }
        }
        ctx.output = Some(Value::Object(output));
        Ok(None)
    }
}

/// Run a body; on error, bind the message and run the handler.
pub struct TryAtom {
    spec: AtomSpec,
}

impl TryAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "try",
                "Run the 'try' steps; on a non-fatal error bind it to 'error' and run 'catch'.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "try": {"type": "array", "items": {"type": "object"}},
                    "catch": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["try"]
            }))?,
        })
    }
}

#[async_trait]
impl Atom for TryAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let try_steps = step.steps_field("try")?;
        let catch_steps = step.opt_steps_field("catch")?;

        // Runs in the current scope: the error binding and any handler
        // writes stay visible after the atom.
        match executor::run_sequence(&try_steps, ctx).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => match catch_steps {
                Some(catch) => {
                    tracing::debug!(op = "try", run_id = %ctx.run_id, error = %err, "handling error");
                    ctx.set("error", Value::String(err.to_string()));
                    executor::run_sequence(&catch, ctx).await?;
                }
                None => return Err(err),
            },
        }
        Ok(None)
    }
}

/// Run a body inside a child scope.
pub struct ScopeAtom {
    spec: AtomSpec,
}

impl ScopeAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "scope",
                "Run child steps in a fresh scope; writes are discarded on exit.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "steps": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["steps"]
            }))?,
        })
    }
}

#[async_trait]
impl Atom for ScopeAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let steps = step.steps_field("steps")?;
        run_in_frame(&steps, ctx).await?;
        Ok(None)
    }
}
