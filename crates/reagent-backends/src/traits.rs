//! Capability traits and the per-run capability bag.
//!
//! Capabilities are the only way an agent program touches the outside world.
//! Implementations return `anyhow::Result`; the atom layer maps failures into
//! the VM error surface. Absence of a capability is not an error until an
//! atom that needs it runs.

use anyhow::Result;
use async_trait::async_trait;
use reagent_core::{Value, VmError};
use std::collections::HashMap;
use std::sync::Arc;

/// Result type for capability implementations.
pub type CapabilityResult<T> = Result<T>;

/// Request options for [`HttpCapability::fetch`].
#[derive(Clone, Debug)]
pub struct FetchInit {
    /// HTTP method, uppercase.
    pub method: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Optional request body, sent as JSON.
    pub body: Option<Value>,
}

impl Default for FetchInit {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

/// Outbound HTTP requests.
#[async_trait]
pub trait HttpCapability: Send + Sync {
    /// Performs a request and returns the decoded response body.
    async fn fetch(&self, url: &str, init: FetchInit) -> CapabilityResult<Value>;
}

/// Key-value and vector storage.
#[async_trait]
pub trait StoreCapability: Send + Sync {
    /// Retrieves a value; `Null` when the key is absent.
    async fn get(&self, key: &str) -> CapabilityResult<Value>;

    /// Stores a value under a key.
    async fn set(&self, key: &str, value: Value) -> CapabilityResult<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CapabilityResult<()>;

    /// Runs a query and returns matching values.
    async fn query(&self, query: &str) -> CapabilityResult<Vec<Value>>;

    /// Returns values nearest to the given embedding vector.
    async fn vector_search(&self, vector: &[f64]) -> CapabilityResult<Vec<Value>>;
}

/// Model inference.
#[async_trait]
pub trait LlmCapability: Send + Sync {
    /// Generates a completion for a prompt.
    async fn predict(&self, prompt: &str, options: Option<Value>) -> CapabilityResult<String>;

    /// Produces an embedding vector for a text.
    async fn embed(&self, text: &str) -> CapabilityResult<Vec<f64>>;
}

/// Recursive invocation of another agent, entirely host-defined. The
/// sub-agent shares neither state nor fuel with the caller.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// Runs the named agent with the given input and returns its output.
    async fn run(&self, agent_id: &str, input: Value) -> CapabilityResult<Value>;
}

/// The bag of capabilities a host hands to a run. Cloning is cheap; the bag
/// is read-only once a run begins.
#[derive(Clone, Default)]
pub struct Capabilities {
    http: Option<Arc<dyn HttpCapability>>,
    store: Option<Arc<dyn StoreCapability>>,
    llm: Option<Arc<dyn LlmCapability>>,
    agent: Option<Arc<dyn AgentCapability>>,
}

impl Capabilities {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an HTTP capability.
    pub fn with_http(mut self, http: Arc<dyn HttpCapability>) -> Self {
        self.http = Some(http);
        self
    }

    /// Attaches a store capability.
    pub fn with_store(mut self, store: Arc<dyn StoreCapability>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attaches an LLM capability.
    pub fn with_llm(mut self, llm: Arc<dyn LlmCapability>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Attaches an agent-invocation capability.
    pub fn with_agent(mut self, agent: Arc<dyn AgentCapability>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// The HTTP capability, or `MissingCapability` if the host left it out.
    pub fn require_http(&self) -> Result<Arc<dyn HttpCapability>, VmError> {
        self.http.clone().ok_or_else(|| missing("fetch"))
    }

    /// The store capability, or `MissingCapability` if the host left it out.
    pub fn require_store(&self) -> Result<Arc<dyn StoreCapability>, VmError> {
        self.store.clone().ok_or_else(|| missing("store"))
    }

    /// The LLM capability, or `MissingCapability` if the host left it out.
    pub fn require_llm(&self) -> Result<Arc<dyn LlmCapability>, VmError> {
        self.llm.clone().ok_or_else(|| missing("llm"))
    }

    /// The agent capability, or `MissingCapability` if the host left it out.
    pub fn require_agent(&self) -> Result<Arc<dyn AgentCapability>, VmError> {
        self.agent.clone().ok_or_else(|| missing("agent"))
    }
}

fn missing(name: &str) -> VmError {
    VmError::MissingCapability {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_empty_bag_reports_missing() {
        let caps = Capabilities::new();
        assert!(matches!(
            caps.require_http(),
            Err(VmError::MissingCapability { name }) if name == "fetch"
        ));
        assert!(caps.require_store().is_err());
        assert!(caps.require_llm().is_err());
        assert!(caps.require_agent().is_err());
    }

    #[test]
    fn test_attached_capability_resolves() {
        let caps = Capabilities::new().with_store(Arc::new(MemoryStore::new()));
        assert!(caps.require_store().is_ok());
        assert!(caps.require_http().is_err());
    }
}
