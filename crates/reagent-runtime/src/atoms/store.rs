//! Store atoms: `store.get`, `store.set`, `store.delete`, `store.query`,
//! `store.vectorSearch`.
//!
//! One handler per operation, all backed by the host's store capability.

use super::{capability_error, resolved, resolved_array, resolved_string, type_error};
use crate::atom::{Atom, AtomSpec};
use crate::config::VmConfig;
use crate::context::RuntimeContext;
use crate::registry::AtomRegistry;
use async_trait::async_trait;
use reagent_core::{Step, Value, VmResult};
use serde_json::json;
use std::sync::Arc;

pub fn install(registry: &AtomRegistry, config: &VmConfig) -> VmResult<()> {
    registry.register(Arc::new(StoreGetAtom::new(config)?));
    registry.register(Arc::new(StoreSetAtom::new(config)?));
    registry.register(Arc::new(StoreDeleteAtom::new(config)?));
    registry.register(Arc::new(StoreQueryAtom::new(config)?));
    registry.register(Arc::new(VectorSearchAtom::new(config)?));
    Ok(())
}

fn key_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {"key": {}},
        "required": ["key"]
    })
}

/// Read a value from the store.
pub struct StoreGetAtom {
    spec: AtomSpec,
}

impl StoreGetAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("store.get", "Read a key from the store; null when absent.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(key_schema())?,
        })
    }
}

#[async_trait]
impl Atom for StoreGetAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let store = ctx.capabilities.require_store()?;
        let key = resolved_string(step, "key", ctx)?;
        let value = store
            .get(&key)
            .await
            .map_err(|e| capability_error("store", e))?;
        Ok(Some(value))
    }
}

/// Write a value to the store.
pub struct StoreSetAtom {
    spec: AtomSpec,
}

impl StoreSetAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("store.set", "Write a value to the store under a key.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"key": {}, "value": {}},
                    "required": ["key", "value"]
                }))?,
        })
    }
}

#[async_trait]
impl Atom for StoreSetAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let store = ctx.capabilities.require_store()?;
        let key = resolved_string(step, "key", ctx)?;
        let value = resolved(step, "value", ctx)?;
        store
            .set(&key, value)
            .await
            .map_err(|e| capability_error("store", e))?;
        Ok(None)
    }
}

/// Remove a key from the store.
pub struct StoreDeleteAtom {
    spec: AtomSpec,
}

impl StoreDeleteAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("store.delete", "Remove a key from the store.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(key_schema())?,
        })
    }
}

#[async_trait]
impl Atom for StoreDeleteAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let store = ctx.capabilities.require_store()?;
        let key = resolved_string(step, "key", ctx)?;
        store
            .delete(&key)
            .await
            .map_err(|e| capability_error("store", e))?;
        Ok(None)
    }
}

/// Query the store for matching values.
pub struct StoreQueryAtom {
    spec: AtomSpec,
}

impl StoreQueryAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new("store.query", "Query the store; returns matching values.")
                .with_timeout_ms(config.io_timeout_ms)
                .with_input_schema(json!({
                    "type": "object",
                    "properties": {"q": {}},
                    "required": ["q"]
                }))?
                .with_output_schema(json!({"type": "array"})),
        })
    }
}

#[async_trait]
impl Atom for StoreQueryAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let store = ctx.capabilities.require_store()?;
        let query = resolved_string(step, "q", ctx)?;
        let matches = store
            .query(&query)
            .await
            .map_err(|e| capability_error("store", e))?;
        Ok(Some(Value::Array(matches)))
    }
}

/// Similarity search over embedded values.
pub struct VectorSearchAtom {
    spec: AtomSpec,
}

impl VectorSearchAtom {
    pub fn new(config: &VmConfig) -> VmResult<Self> {
        Ok(Self {
            spec: AtomSpec::new(
                "store.vectorSearch",
                "Similarity search: returns values nearest to the given vector.",
            )
            .with_timeout_ms(config.io_timeout_ms)
            .with_input_schema(json!({
                "type": "object",
                "properties": {"vec": {}},
                "required": ["vec"]
            }))?
            .with_output_schema(json!({"type": "array"})),
        })
    }
}

#[async_trait]
impl Atom for VectorSearchAtom {
    fn spec(&self) -> &AtomSpec {
        &self.spec
    }

    async fn exec(&self, step: &Step, ctx: &mut RuntimeContext) -> VmResult<Option<Value>> {
        let store = ctx.capabilities.require_store()?;
        let raw = resolved_array(step, "vec", ctx)?;
        let mut vector = Vec::with_capacity(raw.len());
        for component in &raw {
            match component.as_f64() {
                Some(x) => vector.push(x),
                None => {
                    return Err(type_error(step, "vec", "an array of numbers", component));
                }
            }
        }

        let matches = store
            .vector_search(&vector)
            .await
            .map_err(|e| capability_error("store", e))?;
        Ok(Some(Value::Array(matches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::testkit::{exec, test_ctx};
    use reagent_backends::{Capabilities, MemoryStore, StoreCapability};
    use reagent_core::VmError;
    use std::collections::HashMap;

    fn store_caps() -> (Arc<MemoryStore>, Capabilities) {
        let store = Arc::new(MemoryStore::new());
        let caps =
            Capabilities::new().with_store(Arc::clone(&store) as Arc<dyn StoreCapability>);
        (store, caps)
    }

    #[tokio::test]
    async fn test_get_set_delete_round_trip() {
        let (_, caps) = store_caps();
        let mut ctx = test_ctx(HashMap::new(), caps);

        exec(json!({"op": "store.set", "key": "k", "value": 42}), &mut ctx)
            .await
            .unwrap();
        exec(json!({"op": "store.get", "key": "k", "result": "v"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.get("v"), Some(&Value::from(42i64)));

        exec(json!({"op": "store.delete", "key": "k"}), &mut ctx)
            .await
            .unwrap();
        exec(json!({"op": "store.get", "key": "k", "result": "gone"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.get("gone"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_set_resolves_key_and_value() {
        let (store, caps) = store_caps();
        let mut ctx = test_ctx(
            [("url".to_string(), Value::from("http://api.data"))]
                .into_iter()
                .collect(),
            caps,
        );
        ctx.set("fresh", Value::from("data"));

        exec(
            json!({"op": "store.set", "key": "args.url", "value": "fresh"}),
            &mut ctx,
        )
        .await
        .unwrap();
        assert_eq!(
            store.get("http://api.data").await.unwrap(),
            Value::from("data")
        );
    }

    #[tokio::test]
    async fn test_query_binds_matches() {
        let (store, caps) = store_caps();
        store.set("user:1", Value::from("alice")).await.unwrap();
        store.set("post:1", Value::from("hello")).await.unwrap();

        let mut ctx = test_ctx(HashMap::new(), caps);
        exec(json!({"op": "store.query", "q": "user", "result": "hits"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(
            ctx.get("hits"),
            Some(&Value::Array(vec![Value::from("alice")]))
        );
    }

    #[tokio::test]
    async fn test_vector_search() {
        let (store, caps) = store_caps();
        store.insert_vector(vec![1.0, 0.0], Value::from("east")).await;
        store.insert_vector(vec![0.0, 1.0], Value::from("north")).await;

        let mut ctx = test_ctx(HashMap::new(), caps);
        exec(
            json!({"op": "store.vectorSearch", "vec": [0.9, 0.1], "result": "hits"}),
            &mut ctx,
        )
        .await
        .unwrap();

        let hits = ctx.get("hits").and_then(Value::as_array).unwrap();
        assert_eq!(hits[0], Value::from("east"));
    }

    #[tokio::test]
    async fn test_vector_search_rejects_non_numeric() {
        let (_, caps) = store_caps();
        let mut ctx = test_ctx(HashMap::new(), caps);
        let err = exec(
            json!({"op": "store.vectorSearch", "vec": [1.0, "x"]}),
            &mut ctx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VmError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_store_atoms_without_capability() {
        let mut ctx = test_ctx(HashMap::new(), Capabilities::new());
        for op in ["store.get", "store.delete"] {
            let err = exec(json!({"op": op, "key": "k"}), &mut ctx).await.unwrap_err();
            assert!(matches!(err, VmError::MissingCapability { name } if name == "store"));
        }
    }
}
