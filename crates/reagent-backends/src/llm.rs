//! Scripted LLM capability for tests and demos.

use crate::traits::{CapabilityResult, LlmCapability};
use async_trait::async_trait;
use reagent_core::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Embedding width produced by [`ScriptedLlm::embed`].
const EMBED_DIMENSION: usize = 8;

/// An LLM that replays canned completions.
///
/// Queued replies are returned in order; once the queue drains, `predict`
/// echoes the prompt so programs keep making progress. Embeddings are a
/// deterministic function of the input text.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a canned completion.
    pub async fn enqueue(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(reply.into());
    }
}

#[async_trait]
impl LlmCapability for ScriptedLlm {
    async fn predict(&self, prompt: &str, _options: Option<Value>) -> CapabilityResult<String> {
        match self.replies.lock().await.pop_front() {
            Some(reply) => Ok(reply),
            None => Ok(format!("echo: {prompt}")),
        }
    }

    async fn embed(&self, text: &str) -> CapabilityResult<Vec<f64>> {
        let mut vector = vec![0.0f64; EMBED_DIMENSION];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % EMBED_DIMENSION] += byte as f64 / 255.0;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_queued_replies_in_order() {
        let llm = ScriptedLlm::new();
        llm.enqueue("first").await;
        llm.enqueue("second").await;

        assert_eq!(llm.predict("p", None).await.unwrap(), "first");
        assert_eq!(llm.predict("p", None).await.unwrap(), "second");
        assert_eq!(llm.predict("p", None).await.unwrap(), "echo: p");
    }

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let llm = ScriptedLlm::new();
        let a = llm.embed("hello").await.unwrap();
        let b = llm.embed("hello").await.unwrap();
        let c = llm.embed("world").await.unwrap();

        assert_eq!(a.len(), EMBED_DIMENSION);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
