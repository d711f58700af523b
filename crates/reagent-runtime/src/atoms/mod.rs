//! Built-in atom library.
//!
//! One module per atom family. Every atom resolves its operands through the
//! value resolver, so plain strings in AST fields can reference variables or
//! arguments by convention.

pub mod agent;
pub mod flow;
pub mod io;
pub mod list;
pub mod llm;
pub mod logic;
pub mod math;
pub mod object;
pub mod state;
pub mod store;
pub mod string;

use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use crate::resolver::resolve_value;
use reagent_core::{Step, Value, VmError, VmResult};
use std::collections::HashMap;

/// Registers every built-in atom.
pub fn install_builtins(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    flow::install(registry)?;
    state::install(registry, config)?;
    logic::install(registry, config)?;
    math::install(registry, config)?;
    list::install(registry, config)?;
    string::install(registry, config)?;
    object::install(registry, config)?;
    io::install(registry, config)?;
    store::install(registry, config)?;
    llm::install(registry, config)?;
    agent::install(registry, config)?;
    Ok(())
}

/// Resolves a required field through the value resolver.
pub(crate) fn resolved(step: &Step, key: &str, ctx: &RuntimeContext) -> VmResult<Value> {
    Ok(resolve_value(step.require(key)?, ctx))
}

/// Resolves an optional field through the value resolver.
pub(crate) fn opt_resolved(step: &Step, key: &str, ctx: &RuntimeContext) -> Option<Value> {
    step.field(key).map(|v| resolve_value(v, ctx))
}

/// Resolves a required field and requires the result to be a string.
pub(crate) fn resolved_string(step: &Step, key: &str, ctx: &RuntimeContext) -> VmResult<String> {
    match resolved(step, key, ctx)? {
        Value::String(s) => Ok(s),
        other => Err(type_error(step, key, "a string", &other)),
    }
}

/// Resolves a required field and requires the result to be an array.
pub(crate) fn resolved_array(step: &Step, key: &str, ctx: &RuntimeContext) -> VmResult<Vec<Value>> {
    match resolved(step, key, ctx)? {
        Value::Array(items) => Ok(items),
        other => Err(type_error(step, key, "an array", &other)),
    }
}

/// Resolves a required field and requires the result to be an object.
pub(crate) fn resolved_object(
    step: &Step,
    key: &str,
    ctx: &RuntimeContext,
) -> VmResult<HashMap<String, Value>> {
    match resolved(step, key, ctx)? {
        Value::Object(map) => Ok(map),
        other => Err(type_error(step, key, "an object", &other)),
    }
}

pub(crate) fn type_error(step: &Step, key: &str, expected: &str, got: &Value) -> VmError {
    VmError::Validation {
        op: step.op.clone(),
        detail: format!("field '{key}' must resolve to {expected}, got {got}"),
    }
}

/// Numeric coercion for the expression environment: numbers pass through,
/// booleans coerce to 1 and 0 so logic-atom results can drive conditions,
/// everything else is 0.
pub(crate) fn numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        _ => 0.0,
    }
}

/// Builds the expression environment from a step's `vars` field: every entry
/// is resolved, then coerced to a number.
pub(crate) fn expression_vars(
    step: &Step,
    ctx: &RuntimeContext,
) -> VmResult<HashMap<String, f64>> {
    let mut env = HashMap::new();
    match step.field("vars") {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (name, raw) in map {
                let value = resolve_value(raw, ctx);
                env.insert(name.clone(), numeric(&value));
            }
        }
        Some(other) => return Err(type_error(step, "vars", "an object", other)),
    }
    Ok(env)
}

/// Maps a capability failure into the VM error surface.
pub(crate) fn capability_error(name: &str, err: anyhow::Error) -> VmError {
    VmError::Capability {
        name: name.to_string(),
        message: err.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::testkit::{self, test_ctx};
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(numeric(&Value::from(2.5f64)), 2.5);
        assert_eq!(numeric(&Value::from(3i64)), 3.0);
        assert_eq!(numeric(&Value::Bool(true)), 1.0);
        assert_eq!(numeric(&Value::Bool(false)), 0.0);
        assert_eq!(numeric(&Value::from("text")), 0.0);
        assert_eq!(numeric(&Value::Null), 0.0);
        assert_eq!(numeric(&Value::Array(vec![])), 0.0);
    }

    #[test]
    fn test_expression_vars_resolve_and_coerce() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("count", Value::from(4i64));
        ctx.set("flag", Value::Bool(true));

        let step = testkit::step(serde_json::json!({
            "op": "if",
            "vars": {"count": "count", "flag": "flag", "lit": 7, "obj": "missing"}
        }));

        let env = expression_vars(&step, &ctx).unwrap();
        assert_eq!(env["count"], 4.0);
        assert_eq!(env["flag"], 1.0);
        assert_eq!(env["lit"], 7.0);
        assert_eq!(env["obj"], 0.0);
    }
}
