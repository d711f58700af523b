//! In-memory store backend.
//!
//! Reference implementation of [`StoreCapability`]: a RwLock-guarded map for
//! key-value access plus a flat list of embedded entries for vector search.
//! Suitable for tests, demos, and single-process hosts; persistent stores are
//! the host's business.

use crate::traits::{CapabilityResult, StoreCapability};
use async_trait::async_trait;
use reagent_core::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How many entries a vector search returns at most.
const VECTOR_SEARCH_LIMIT: usize = 10;

/// An embedded value for similarity search.
#[derive(Clone, Debug)]
struct VectorEntry {
    vector: Vec<f64>,
    value: Value,
}

/// In-memory key-value and vector store.
///
/// Time:
/// - get/set/delete: average O(1)
/// - query: O(n log n) for the deterministic key ordering
/// - vector_search: O(n) scans plus a sort of the matches
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, Value>>>,
    vectors: Arc<RwLock<Vec<VectorEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Adds an embedded value for vector search.
    pub async fn insert_vector(&self, vector: Vec<f64>, value: Value) {
        self.vectors.write().await.push(VectorEntry { vector, value });
    }
}

#[async_trait]
impl StoreCapability for MemoryStore {
    async fn get(&self, key: &str) -> CapabilityResult<Value> {
        Ok(self
            .data
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn set(&self, key: &str, value: Value) -> CapabilityResult<()> {
        if key.is_empty() {
            anyhow::bail!("key must not be empty");
        }
        self.data.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CapabilityResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn query(&self, query: &str) -> CapabilityResult<Vec<Value>> {
        let data = self.data.read().await;

        // Deterministic ordering to avoid flakiness and surprising results.
        let mut keys: Vec<&String> = data.keys().filter(|k| k.contains(query)).collect();
        keys.sort_unstable();

        Ok(keys.into_iter().filter_map(|k| data.get(k).cloned()).collect())
    }

    async fn vector_search(&self, vector: &[f64]) -> CapabilityResult<Vec<Value>> {
        let entries = self.vectors.read().await;

        let mut scored: Vec<(f64, &VectorEntry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(vector, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(VECTOR_SEARCH_LIMIT)
            .map(|(_, entry)| entry.value.clone())
            .collect())
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
