//! Object atoms: `pick`, `merge`, `keys`.

use super::{resolved_array, resolved_object};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(PickAtom::new(config)?));
    registry.register(Arc::new(MergeAtom::new(config)?));
    registry.register(Arc::new(KeysAtom::new(config)?));
    Ok(())
}

/// Project an object down to the listed keys.
pub struct PickAtom {
    spec: AtomSpec,
}

impl PickAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("pick", "Project an object onto the listed keys.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {
                        "obj": {},
                        "keys": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["obj", "keys"]
                }))?
                .with_output_schema(json!({"type": "object"})),
        })
    }
}

#[async_trait]
impl Atom for PickAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let source = resolved_object(step, "obj", ctx)?;
        let keys = resolved_array(step, "keys", ctx)?;

        // Missing keys are simply absent from the projection.
        let mut picked = HashMap::new();
        for key in keys {
            if let Value::String(name) = key {
                if let Some(value) = source.get(&name) {
                    picked.insert(name, value.clone());
                }
            }
        }
        Ok(Some(Value::Object(picked)))
    }
}

/// Right-biased shallow merge of two objects.
pub struct MergeAtom {
    spec: AtomSpec,
}

impl MergeAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("merge", "Shallow merge of two objects; right side wins.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"a": {}, "b": {}},
                    "required": ["a", "b"]
                }))?
                .with_output_schema(json!({"type": "object"})),
        })
    }
}

#[async_trait]
impl Atom for MergeAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let mut merged = resolved_object(step, "a", ctx)?;
        let right = resolved_object(step, "b", ctx)?;
        merged.extend(right);
        Ok(Some(Value::Object(merged)))
    }
}

/// Enumerate an object's keys.
pub struct KeysAtom {
    spec: AtomSpec,
}

impl KeysAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("keys", "Enumerate an object's keys, sorted.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"obj": {}},
                    "required": ["obj"]
                }))?
                .with_output_schema(json!({"type": "array", "items": {"type": "string"}})),
        })
    }
}

#[async_trait]
impl Atom for KeysAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let source = resolved_object(step, "obj", ctx)?;
        let mut names: Vec<String> = source.into_keys().collect();
        names.sort_unstable();
        Ok(Some(Value::Array(names.into_iter().map(Value::String).collect())))
    }
}
