//! Math atom: `math.calc`.

use super::expression_vars;
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::expr;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Number, Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(MathCalcAtom::new(config)?));
    Ok(())
}

/// Evaluate an arithmetic or relational expression over resolved variables.
pub struct MathCalcAtom {
    spec: AtomSpec,
}

impl MathCalcAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "math.calc",
                "Evaluate an expression over the resolved 'vars' environment.",
            )
            .with_timeout_ms(config.compute_timeout_ms)
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "expr": {"type": "string"},
                    "vars": {"type": "object"}
                },
                "required": ["expr"]
            }))?
            .with_output_schema(json!({"type": "number"})),
        })
    }
}

#[async_trait]
impl Atom for MathCalcAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let env = expression_vars(step, ctx)?;
        let expr = step.string_field("expr")?;
        let value = expr::evaluate(expr, &env)?;
        Ok(Some(Value::Number(Number::Float(value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::testkit::{exec, test_ctx};
    use reagent_core::VmError;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_calc_with_resolved_vars() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("x", Value::from(2i64));
        ctx.set("y", Value::from(3i64));

        exec(
            json!({"op": "math.calc", "expr": "x + y * 2", "vars": {"x": "x", "y": "y"}, "result": "out"}),
            &mut ctx,
        )
        .await
        .unwrap();
        assert_eq!(ctx.get("out"), Some(&Value::from(8.0f64)));
    }

    #[tokio::test]
    async fn test_calc_relational_result() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        exec(
            json!({"op": "math.calc", "expr": "5 >= 5", "result": "out"}),
            &mut ctx,
        )
        .await
        .unwrap();
        assert_eq!(ctx.get("out"), Some(&Value::from(1.0f64)));
    }

    #[tokio::test]
    async fn test_calc_rejects_non_string_expr() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        let err = exec(json!({"op": "math.calc", "expr": 5}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, VmError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_calc_surfaces_expression_errors() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        let err = exec(json!({"op": "math.calc", "expr": "1 +"}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, VmError::Expr(_)));
    }
}
