//! String atoms: `split`, `join`, `template`.

use super::{resolved_array, resolved_string};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use crate::resolver::resolve_value;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(SplitAtom::new(config)?));
    registry.register(Arc::new(JoinAtom::new(config)?));
    registry.register(Arc::new(TemplateAtom::new(config)?));
    Ok(())
}

/// Split a string on a separator.
pub struct SplitAtom {
    spec: AtomSpec,
}

impl SplitAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("split", "Split a string on a separator into a list.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"str": {}, "sep": {}},
                    "required": ["str", "sep"]
                }))?
                .with_output_schema(json!({"type": "array", "items": {"type": "string"}})),
        })
    }
}

#[async_trait]
impl Atom for SplitAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let text = resolved_string(step, "str", ctx)?;
        let sep = resolved_string(step, "sep", ctx)?;

        let parts: Vec<Value> = if sep.is_empty() {
            text.chars().map(|c| Value::String(c.to_string())).collect()
        } else {
            text.split(&sep).map(Value::from).collect()
        };
        Ok(Some(Value::Array(parts)))
    }
}

/// Join list elements with a separator.
pub struct JoinAtom {
    spec: AtomSpec,
}

impl JoinAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("join", "Join list elements into a string with a separator.")
                .with_timeout_ms(config.compute_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"list": {}, "sep": {}},
                    "required": ["list", "sep"]
                }))?
                .with_output_schema(json!({"type": "string"})),
        })
    }
}

#[async_trait]
impl Atom for JoinAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let items = resolved_array(step, "list", ctx)?;
        let sep = resolved_string(step, "sep", ctx)?;

        let joined = items
            .iter()
            .map(Value::display_string)
            .collect::<Vec<_>>()
            .join(&sep);
        Ok(Some(Value::String(joined)))
    }
}

/// Interpolate `{{name}}` placeholders from a variable map.
pub struct TemplateAtom {
    spec: AtomSpec,
    placeholder: Regex,
}

impl TemplateAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        let placeholder = Regex::new(r"\{\{(\w+)\}\}").map_err(|e| {
            reagent_core::VmError::Validation {
                op: "template".to_string(),
                detail: format!("invalid placeholder pattern: {e}"),
            }
        })?;

        Ok(Self {
            spec: AtomSpec::new(
                "template",
                "Replace every {{name}} with the stringified value from 'vars'.",
            )
            .with_timeout_ms(config.compute_timeout_ms)
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "tmpl": {},
                    "vars": {"type": "object"}
                },
                "required": ["tmpl"]
            }))?
            .with_output_schema(json!({"type": "string"})),
            placeholder,
        })
    }
}

#[async_trait]
impl Atom for TemplateAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let template = resolved_string(step, "tmpl", ctx)?;
        let vars = match step.field("vars") {
            Some(Value::Object(map)) => map.clone(),
            _ => Default::default(),
        };

        let rendered = self.placeholder.replace_all(&template, |caps: &regex::Captures| {
            vars.get(&caps[1])
                .map(|raw| resolve_value(raw, ctx).display_string())
                .unwrap_or_default()
        });
        Ok(Some(Value::String(rendered.into_owned())))
    }
}
