//! List atoms: `map`, `push`, `len`.

use super::{resolved, resolved_array, type_error};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::executor;
use crate::registry::AtomRegistry;
use crate::resolver::resolve_value;
use async_trait::async_trait;
use reagent_core::{Number, Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(MapAtom::new()?));
    registry.register(Arc::new(PushAtom::new(config)?));
    registry.register(Arc::new(LenAtom::new(config)?));
    Ok(())
}

/// Run a body once per element, collecting each iteration's `result`.
///
/// A flow atom in disguise: no timeout, children pay their own fuel.
pub struct MapAtom {
    spec: AtomSpec,
}

impl MapAtom {
    pub fn new() -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "map",
                "For each element, bind it in a child scope, run the body, and collect 'result'.",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "items": {},
                    "as": {"type": "string"},
                    "steps": {"type": "array", "items": {"type": "object"}}
                },
                "required": ["items", "as", "steps"]
            }))?
            .with_output_schema(json!({"type": "array"})),
        })
    }
}

#[async_trait]
impl Atom for MapAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let items = resolved_array(step, "items", ctx)?;
        let as_name = step.string_field("as")?.to_string();
        let steps = step.steps_field("steps")?;

        let mut collected = Vec::with_capacity(items.len());
        for item in items {
            ctx.push_frame();
            ctx.set(as_name.clone(), item);
            let run = executor::run_sequence(&steps, ctx).await;
            // Each iteration publishes through its own 'result' binding; no
            // fallthrough, so enclosing state never leaks into the output.
            let produced = ctx.get_local("result").cloned();
            ctx.pop_frame();
            run?;
            collected.push(produced.unwrap_or(Value::Null));

            if ctx.output.is_some() {
                break;
            }
        }
        Ok(Some(Value::Array(collected)))
    }
}

/// Append an item to a list, mutating the owning binding in place.
pub struct PushAtom {
    spec: AtomSpec,
}

impl PushAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("push", "Append an item to a list in place; return the list.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"list": {}, "item": {}},
                    "required": ["list", "item"]
                }))?
                .with_output_schema(json!({"type": "array"})),
        })
    }
}

#[async_trait]
impl Atom for PushAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let item = resolved(step, "item", ctx)?;
        let list_ref = step.require("list")?;
        let mut items = match resolve_value(list_ref, ctx) {
            Value::Array(items) => items,
            other => return Err(type_error(step, "list", "an array", &other)),
        };
        items.push(item);
        let updated = Value::Array(items);

        // In-place semantics: a named list is replaced wherever it is bound.
        if let Value::String(name) = list_ref {
            let name = name.clone();
            ctx.replace(&name, updated.clone());
        }
        Ok(Some(updated))
    }
}

/// Length of a sequence or string; zero for anything else.
pub struct LenAtom {
    spec: AtomSpec,
}

impl LenAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("len", "Length of a list or string; 0 for other values.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"list": {}},
                    "required": ["list"]
                }))?
                .with_output_schema(json!({"type": "number"})),
        })
    }
}

#[async_trait]
impl Atom for LenAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let length = match resolved(step, "list", ctx)? {
            Value::Array(items) => items.len(),
            Value::String(s) => s.chars().count(),
            _ => 0,
        };
        Ok(Some(Value::Number(Number::from(length))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::testkit::{exec, test_ctx};
    use reagent_core::VmError;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_map_collects_results() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set(
            "xs",
            Value::Array(vec![Value::from(1i64), Value::from(2i64), Value::from(3i64)]),
        );

        exec(
            json!({"op": "map", "items": "xs", "as": "x", "result": "out", "steps": [
                {"op": "math.calc", "expr": "x * 10", "vars": {"x": "x"}, "result": "result"}
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();

        assert_eq!(
            ctx.get("out"),
            Some(&Value::Array(vec![
                Value::from(10.0f64),
                Value::from(20.0f64),
                Value::from(30.0f64)
            ]))
        );
    }

    #[tokio::test]
    async fn test_map_missing_result_yields_null() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("xs", Value::Array(vec![Value::from(1i64), Value::from(2i64)]));

        exec(
            json!({"op": "map", "items": "xs", "as": "x", "result": "out", "steps": [
                {"op": "var.set", "key": "scratch", "value": 0}
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();

        assert_eq!(
            ctx.get("out"),
            Some(&Value::Array(vec![Value::Null, Value::Null]))
        );
    }

    #[tokio::test]
    async fn test_map_result_does_not_fall_through() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("xs", Value::Array(vec![Value::from(1i64)]));
        // An enclosing 'result' binding must not leak into the output list.
        ctx.set("result", Value::from("outer"));

        exec(
            json!({"op": "map", "items": "xs", "as": "x", "result": "out", "steps": [
                {"op": "var.set", "key": "scratch", "value": 0}
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();

        assert_eq!(ctx.get("out"), Some(&Value::Array(vec![Value::Null])));
    }

    #[tokio::test]
    async fn test_map_isolates_iteration_scopes() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("xs", Value::Array(vec![Value::from(1i64), Value::from(2i64)]));

        exec(
            json!({"op": "map", "items": "xs", "as": "x", "steps": [
                {"op": "var.set", "key": "leak", "value": true}
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();
        assert_eq!(ctx.get("leak"), None);
        assert_eq!(ctx.get("x"), None);
    }

    #[tokio::test]
    async fn test_map_rejects_non_array_items() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        let err = exec(
            json!({"op": "map", "items": 5, "as": "x", "steps": []}),
            &mut ctx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VmError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_push_mutates_named_binding() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("xs", Value::Array(vec![Value::from(1i64)]));

        exec(json!({"op": "push", "list": "xs", "item": 2}), &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            ctx.get("xs"),
            Some(&Value::Array(vec![Value::from(1i64), Value::from(2i64)]))
        );
    }

    #[tokio::test]
    async fn test_push_literal_list_returns_appended() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        exec(
            json!({"op": "push", "list": [1], "item": 2, "result": "out"}),
            &mut ctx,
        )
        .await
        .unwrap();
        assert_eq!(
            ctx.get("out"),
            Some(&Value::Array(vec![Value::from(1i64), Value::from(2i64)]))
        );
    }

    #[tokio::test]
    async fn test_len() {
        let mut ctx = test_ctx(HashMap::new(), Default::default());
        ctx.set("xs", Value::Array(vec![Value::Null, Value::Null]));

        exec(json!({"op": "len", "list": "xs", "result": "n"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.get("n"), Some(&Value::from(2i64)));

        exec(json!({"op": "len", "list": "hello", "result": "n"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.get("n"), Some(&Value::from(5i64)));

        exec(json!({"op": "len", "list": 42, "result": "n"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.get("n"), Some(&Value::from(0i64)));
    }
}
