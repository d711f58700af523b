//! Reagent Backends - capability surface of the agent VM.
//!
//! The VM invokes host effects (network, storage, model inference) through
//! the capability traits defined here. Hosts assemble a [`Capabilities`] bag
//! from their own implementations; this crate also ships reference
//! implementations: a reqwest HTTP client, an in-memory key-value and vector
//! store, and a scripted LLM for tests and demos.

pub mod http;
pub mod llm;
pub mod store;
pub mod traits;

pub use http::HttpClient;
pub use llm::ScriptedLlm;
pub use store::{MemoryStore, cosine_similarity};
pub use traits::{
    AgentCapability, Capabilities, CapabilityResult, FetchInit, HttpCapability, LlmCapability,
    StoreCapability,
};
