//! Atom registry.
//!
//! Thread-safe lookup from op code to atom. The VM seeds it with the
//! built-in library and overlays caller-supplied custom atoms; on conflict
//! the custom atom wins.

use crate::atom::Atom;
use crate::atoms;
use crate::config::VmConfig;
use dashmap::DashMap;
use reagent_core::VmResult;
use std::sync::Arc;

#[derive(Default)]
pub struct AtomRegistry {
    atoms: DashMap<String, Arc<dyn Atom>>,
}

impl AtomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with every built-in atom.
    pub fn with_builtins(config: &VmConfig) -> VmResult<Self> {
        let registry = Self::new();
        atoms::install_builtins(&registry, config)?;
        Ok(registry)
    }

    /// Registers an atom under its op code, replacing any existing entry.
    pub fn register(&self, atom: Arc<dyn Atom>) {
        let op = atom.spec().op().to_string();
        if self.atoms.insert(op.clone(), atom).is_some() {
            tracing::debug!(op = %op, "atom overridden");
        }
    }

    /// Looks up an atom by op code.
    pub fn get(&self, op: &str) -> Option<Arc<dyn Atom>> {
        self.atoms.get(op).map(|entry| Arc::clone(entry.value()))
    }

    /// Checks whether an op code is registered.
    pub fn contains(&self, op: &str) -> bool {
        self.atoms.contains_key(op)
    }

    /// All registered op codes, sorted.
    pub fn ops(&self) -> Vec<String> {
        let mut ops: Vec<String> = self.atoms.iter().map(|e| e.key().clone()).collect();
        ops.sort_unstable();
        ops
    }

    /// Op codes with their docs, sorted, for host-side introspection.
    pub fn catalog(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .atoms
            .iter()
            .map(|e| (e.key().clone(), e.value().spec().docs().to_string()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomSpec;
    use crate::context::RuntimeContext;
    use async_trait::async_trait;
    use reagent_core::{Step, Value};

    struct ProbeAtom {
        spec: AtomSpec,
        reply: Value,
    }

    impl ProbeAtom {
        fn new(op: &str, reply: Value) -> Self {
            Self {
                spec: AtomSpec::new(op, "Test probe."),
                reply,
            }
        }
    }

    #[async_trait]
    impl Atom for ProbeAtom {
        fn spec(&self) -> &AtomSpec {
            &self.spec
        }

        async fn exec(
            &self,
            _step: &Step,
            _ctx: &mut RuntimeContext,
        ) -> reagent_core::VmResult<Option<Value>> {
            Ok(Some(self.reply.clone()))
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = AtomRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(ProbeAtom::new("probe", Value::Null)));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("probe"));
        assert!(registry.get("probe").is_some());
        assert!(registry.get("absent").is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = AtomRegistry::new();
        registry.register(Arc::new(ProbeAtom::new("probe", Value::from(1i64))));
        registry.register(Arc::new(ProbeAtom::new("probe", Value::from(2i64))));

        assert_eq!(registry.len(), 1);
        let atom = registry.get("probe").unwrap();
        assert_eq!(atom.spec().op(), "probe");
    }

    #[test]
    fn test_builtins_cover_the_library() {
        let registry = AtomRegistry::with_builtins(&VmConfig::default()).unwrap();
        for op in [
            "seq",
            "if",
            "while",
            "return",
            "try",
            "scope",
            "var.set",
            "var.get",
            "logic.eq",
            "logic.neq",
            "logic.gt",
            "logic.lt",
            "logic.and",
            "logic.or",
            "logic.not",
            "math.calc",
            "map",
            "push",
            "len",
            "split",
            "join",
            "template",
            "pick",
            "merge",
            "keys",
            "http.fetch",
            "store.get",
            "store.set",
            "store.delete",
            "store.query",
            "store.vectorSearch",
            "llm.predict",
            "llm.embed",
            "agent.run",
        ] {
            assert!(registry.contains(op), "missing builtin '{op}'");
        }
    }

    #[test]
    fn test_catalog_is_sorted_and_documented() {
        let registry = AtomRegistry::with_builtins(&VmConfig::default()).unwrap();
        let catalog = registry.catalog();
        assert_eq!(catalog.len(), registry.len());
        assert!(catalog.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(catalog.iter().all(|(_, docs)| !docs.is_empty()));
    }
}
