//! Logic atoms: `logic.eq`, `logic.neq`, `logic.gt`, `logic.lt`,
//! `logic.and`, `logic.or`, `logic.not`.
//!
//! One handler covers the whole family. Operands resolve through the value
//! resolver and the result is always a boolean. Equality is value equality
//! with numeric cross-variant comparison; ordering is defined for pairs of
//! numbers and pairs of strings, anything else compares false.

use super::resolved;
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
enum LogicOp {
    Eq,
    Neq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl LogicOp {
    fn code(self) -> &'static str {
        match self {
            LogicOp::Eq => "logic.eq",
            LogicOp::Neq => "logic.neq",
            LogicOp::Gt => "logic.gt",
            LogicOp::Lt => "logic.lt",
            LogicOp::And => "logic.and",
            LogicOp::Or => "logic.or",
            LogicOp::Not => "logic.not",
        }
    }

    fn docs(self) -> &'static str {
        match self {
            LogicOp::Eq => "Value equality of two operands.",
            LogicOp::Neq => "Value inequality of two operands.",
            LogicOp::Gt => "Ordering: left greater than right.",
            LogicOp::Lt => "Ordering: left less than right.",
            LogicOp::And => "Both operands truthy.",
            LogicOp::Or => "Either operand truthy.",
            LogicOp::Not => "Operand not truthy.",
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, LogicOp::Not)
    }
}

pub struct LogicAtom {
    spec: AtomSpec,
    op: LogicOp,
}

impl LogicAtom {
    fn new(op: LogicOp, config: &VmConfig) -> VmResult<Self> {
        let schema = if op.is_unary() {
            json!({
                "type": "object",
                "properties": {"value": {}},
                "required": ["value"]
            })
        } else {
            json!({
                "type": "object",
                "properties": {"a": {}, "b": {}},
                "required": ["a", "b"]
            })
        };

        Ok(Self {
            spec: AtomSpec::new(op.code(), op.docs())
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(schema)?
                .with_output_schema(json!({"type": "boolean"})),
            op,
        })
    }
}

#[async_trait]
impl Atom for LogicAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let verdict = match self.op {
            LogicOp::Not => !resolved(step, "value", ctx)?.is_truthy(),
            LogicOp::Eq => resolved(step, "a", ctx)? == resolved(step, "b", ctx)?,
            LogicOp::Neq => resolved(step, "a", ctx)? != resolved(step, "b", ctx)?,
            LogicOp::Gt => ordered(&resolved(step, "a", ctx)?, &resolved(step, "b", ctx)?)
                .is_some_and(|ord| ord == std::cmp::Ordering::Greater),
            LogicOp::Lt => ordered(&resolved(step, "a", ctx)?, &resolved(step, "b", ctx)?)
                .is_some_and(|ord| ord == std::cmp::Ordering::Less),
            LogicOp::And => {
                resolved(step, "a", ctx)?.is_truthy() && resolved(step, "b", ctx)?.is_truthy()
            }
            LogicOp::Or => {
                resolved(step, "a", ctx)?.is_truthy() || resolved(step, "b", ctx)?.is_truthy()
            }
        };
        Ok(Some(Value::Bool(verdict)))
    }
}

/// Total order on number pairs and string pairs; anything else is unordered.
fn ordered(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    for op in [
        LogicOp::Eq,
        LogicOp::Neq,
        LogicOp::Gt,
        LogicOp::Lt,
        LogicOp::And,
        LogicOp::Or,
        LogicOp::Not,
    ] {
        registry.register(Arc::new(LogicAtom::new(op, config)?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::testkit::{exec, test_ctx};
    use std::collections::HashMap;

    async fn eval(step: serde_json::Value) -> Value {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("cached", Value::Null);
        ctx.set("name", Value::from("alice"));
        ctx.set("n", Value::from(2i64));

        let mut with_result = step;
        with_result["result"] = serde_json::json!("out");
        exec(with_result, &mut ctx).await.unwrap();
        ctx.get("out").cloned().unwrap()
    }

    #[tokio::test]
    async fn test_eq_and_neq() {
        assert_eq!(eval(json!({"op": "logic.eq", "a": 1, "b": 1})).await, Value::Bool(true));
        assert_eq!(eval(json!({"op": "logic.eq", "a": 1, "b": 2})).await, Value::Bool(false));
        assert_eq!(
            eval(json!({"op": "logic.neq", "a": "cached", "b": null})).await,
            Value::Bool(false)
        );
        assert_eq!(
            eval(json!({"op": "logic.neq", "a": "name", "b": null})).await,
            Value::Bool(true)
        );
    }

    #[tokio::test]
    async fn test_eq_is_numeric_across_variants() {
        assert_eq!(eval(json!({"op": "logic.eq", "a": 2, "b": 2.0})).await, Value::Bool(true));
    }

    #[tokio::test]
    async fn test_ordering_numbers_and_strings() {
        assert_eq!(eval(json!({"op": "logic.gt", "a": 3, "b": 2})).await, Value::Bool(true));
        assert_eq!(eval(json!({"op": "logic.lt", "a": 3, "b": 2})).await, Value::Bool(false));
        assert_eq!(
            eval(json!({"op": "logic.lt", "a": "apple", "b": "banana"})).await,
            Value::Bool(true)
        );
        // Mixed types are unordered.
        assert_eq!(eval(json!({"op": "logic.gt", "a": 3, "b": "2"})).await, Value::Bool(false));
        assert_eq!(eval(json!({"op": "logic.lt", "a": 3, "b": "2"})).await, Value::Bool(false));
    }

    #[tokio::test]
    async fn test_connectives() {
        assert_eq!(
            eval(json!({"op": "logic.and", "a": true, "b": 1})).await,
            Value::Bool(true)
        );
        assert_eq!(
            eval(json!({"op": "logic.and", "a": true, "b": 0})).await,
            Value::Bool(false)
        );
        assert_eq!(
            eval(json!({"op": "logic.or", "a": false, "b": "n"})).await,
            Value::Bool(true)
        );
        assert_eq!(
            eval(json!({"op": "logic.not", "value": null})).await,
            Value::Bool(true)
        );
        assert_eq!(
            eval(json!({"op": "logic.not", "value": "name"})).await,
            Value::Bool(false)
        );
    }

    #[tokio::test]
    async fn test_operands_resolve_through_state() {
        assert_eq!(
            eval(json!({"op": "logic.eq", "a": "n", "b": 2})).await,
            Value::Bool(true)
        );
    }
}
