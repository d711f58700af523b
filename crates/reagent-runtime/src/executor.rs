//! Atom executor.
//!
//! Every dispatch goes through the same pipeline: look up the atom, validate
//! the step's input fields against the atom's schema, run `exec` under the
//! atom's timeout, and bind a produced value into scope when the step names a
//! result variable. Sequences add fuel accounting and the output unwind on
//! top.

use crate::context::RuntimeContext;
use reagent_core::{Step, VmError, VmResult};
use std::time::Duration;

/// Dispatches the children of a sequence in order.
///
/// Each child costs one unit of fuel before it runs. Iteration stops as soon
/// as the run's output is set.
pub async fn run_sequence(steps: &[Step], ctx: &mut RuntimeContext) -> VmResult<()> {
    for step in steps {
        if ctx.output.is_some() {
            break;
        }
        ctx.consume_fuel()?;
        execute_step(step, ctx).await?;
    }
    Ok(())
}

/// Dispatches a single step through its atom.
pub async fn execute_step(step: &Step, ctx: &mut RuntimeContext) -> VmResult<()> {
    let atom = ctx
        .registry
        .get(&step.op)
        .ok_or_else(|| VmError::UnknownAtom {
            op: step.op.clone(),
        })?;
    let spec = atom.spec();

    if let Some(schema) = spec.input_schema() {
        let payload = step.input_json()?;
        if let Err(violation) = schema.validate(&payload) {
            return Err(VmError::Validation {
                op: step.op.clone(),
                detail: format!("{violation} (payload: {payload})"),
            });
        }
    }

    tracing::debug!(op = %step.op, run_id = %ctx.run_id, "dispatching atom");

    let timeout_ms = spec.timeout_ms();
    let produced = if timeout_ms > 0 {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), atom.exec(step, ctx)).await {
            Ok(result) => result?,
            Err(_) => {
                // The pending work is dropped; capability implementations own
                // cancellation safety.
                return Err(VmError::Timeout {
                    op: step.op.clone(),
                    timeout_ms,
                });
            }
        }
    } else {
        atom.exec(step, ctx).await?
    };

    if let (Some(name), Some(value)) = (step.result.clone(), produced) {
        ctx.set(name, value);
    }

    Ok(())
}
