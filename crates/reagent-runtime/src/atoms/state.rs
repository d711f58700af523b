//! State atoms: `var.set`, `var.get`.

use super::resolved;
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(VarSetAtom::new(config)?));
    registry.register(Arc::new(VarGetAtom::new(config)?));
    Ok(())
}

/// Bind a value in the current scope.
///
/// The value is stored raw. Reference strings only take effect when a
/// consuming atom resolves them; `var.set` does not.
pub struct VarSetAtom {
    spec: AtomSpec,
}

impl VarSetAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("var.set", "Bind a raw value to a variable in the current scope.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {
                        "key": {"type": "string"},
                        "value": {}
                    },
                    "required": ["key", "value"]
                }))?,
        })
    }
}

#[async_trait]
impl Atom for VarSetAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let key = step.string_field("key")?.to_string();
        let value = step.require("value")?.clone();
        ctx.set(key, value);
        Ok(None)
    }
}

/// Resolve a name to its bound value.
pub struct VarGetAtom {
    spec: AtomSpec,
}

impl VarGetAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "var.get",
                "Resolve a key: the bound value, or the literal key when unbound.",
            )
            .with_timeout_ms(config.compute_timeout_ms)
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "key": {}
                },
                "required": ["key"]
            }))?,
        })
    }
}

#[async_trait]
impl Atom for VarGetAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        Ok(Some(resolved(step, "key", ctx)?))
    }
}
