//! Agent atom: `agent.run`.

use super::{capability_error, opt_resolved, resolved_string};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(AgentRunAtom::new(config)?));
    Ok(())
}

/// Invoke another agent through the host.
///
/// The sub-agent runs with its own state and fuel; only its output flows
/// back.
pub struct AgentRunAtom {
    spec: AtomSpec,
}

impl AgentRunAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("agent.run", "Run another agent by id and return its output.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"agentId": {}, "input": {}},
                    "required": ["agentId"]
                }))?,
        })
    }
}

#[async_trait]
impl Atom for AgentRunAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let host = ctx.capabilities.require_agent()?;
        let agent_id = resolved_string(step, "agentId", ctx)?;
        let input = opt_resolved(step, "input", ctx).unwrap_or(Value::Null);

        tracing::debug!(run_id = %ctx.run_id, agent_id = %agent_id, "delegating to sub-agent");
        let output = host
            .run(&agent_id, input)
            .await
            .map_err(|e| capability_error("agent", e))?;
        Ok(Some(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::testkit::{exec, test_ctx};
    use reagent_backends::{AgentCapability, Capabilities, CapabilityResult};
    use reagent_core::VmError;
    use std::collections::HashMap;

    /// Echoes the agent id and input back as an object.
    struct EchoAgentHost;

    #[async_trait]
    impl AgentCapability for EchoAgentHost {
        async fn run(&self, agent_id: &str, input: Value) -> CapabilityResult<Value> {
            Ok(Value::Object(
                [
                    ("agent".to_string(), Value::from(agent_id)),
                    ("input".to_string(), input),
                ]
                .into_iter()
                .collect(),
            ))
        }
    }

    #[tokio::test]
    async fn test_agent_run_returns_sub_agent_output() {
        let caps = Capabilities::new().with_agent(Arc::new(EchoAgentHost));
        let mut ctx = test_ctx(HashMap::new(), caps);
        ctx.set("payload", Value::from(7i64));

        exec(
            json!({"op": "agent.run", "agentId": "summarizer", "input": "payload", "result": "out"}),
            &mut ctx,
        )
        .await
        .unwrap();

        let out = ctx.get("out").and_then(Value::as_object).unwrap();
        assert_eq!(out["agent"], Value::from("summarizer"));
        assert_eq!(out["input"], Value::from(7i64));
    }

    #[tokio::test]
    async fn test_agent_run_without_capability() {
        let mut ctx = test_ctx(HashMap::new(), Capabilities::new());
        let err = exec(json!({"op": "agent.run", "agentId": "x"}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, VmError::MissingCapability { name } if name == "agent"));
    }
}
