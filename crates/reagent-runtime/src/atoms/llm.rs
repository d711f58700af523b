//! LLM atoms: `llm.predict`, `llm.embed`.

use super::{capability_error, opt_resolved, resolved_string};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Number, Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(LlmPredictAtom::new(config)?));
    registry.register(Arc::new(LlmEmbedAtom::new(config)?));
    Ok(())
}

/// Generate a completion through the host's LLM capability.
pub struct LlmPredictAtom {
    spec: AtomSpec,
}

impl LlmPredictAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("llm.predict", "Generate a completion for a prompt.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"prompt": {}, "options": {}},
                    "required": ["prompt"]
                }))?
                .with_output_schema(json!({"type": "string"})),
        })
    }
}

#[async_trait]
impl Atom for LlmPredictAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let llm = ctx.capabilities.require_llm()?;
        let prompt = resolved_string(step, "prompt", ctx)?;
        let options = opt_resolved(step, "options", ctx);

        tracing::debug!(run_id = %ctx.run_id, prompt_len = prompt.len(), "llm predict");
        let completion = llm
            .predict(&prompt, options)
            .await
            .map_err(|e| capability_error("llm", e))?;
        Ok(Some(Value::String(completion)))
    }
}

/// Embed a text through the host's LLM capability.
pub struct LlmEmbedAtom {
    spec: AtomSpec,
}

impl LlmEmbedAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("llm.embed", "Produce an embedding vector for a text.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"text": {}},
                    "required": ["text"]
                }))?
                .with_output_schema(json!({"type": "array", "items": {"type": "number"}})),
        })
    }
}

#[async_trait]
impl Atom for LlmEmbedAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let llm = ctx.capabilities.require_llm()?;
        let text = resolved_string(step, "text", ctx)?;
        let vector = llm
            .embed(&text)
            .await
            .map_err(|e| capability_error("llm", e))?;
        Ok(Some(Value::Array(
            vector
                .into_iter()
                .map(|x| Value::Number(Number::Float(x)))
                .collect(),
        )))
    }
}
