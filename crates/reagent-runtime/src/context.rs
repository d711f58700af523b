//! Per-run execution context.
//!
//! A `RuntimeContext` is created by the VM for one run, mutated only by the
//! atom currently executing, and discarded when the run returns. Scoped state
//! is a stack of frames: reads walk the stack top-down, writes hit the top
//! frame only.

use crate::registry::AtomRegistry;
use reagent_backends::Capabilities;
use reagent_core::{Value, VmError, VmResult};
use std::collections::HashMap;
use std::sync::Arc;

pub struct RuntimeContext {
    /// Unique run ID for tracing.
    pub run_id: String,
    /// Immutable arguments supplied by the caller.
    pub args: HashMap<String, Value>,
    /// Host effects available to this run.
    pub capabilities: Capabilities,
    /// Atom lookup, read-only after construction.
    pub registry: Arc<AtomRegistry>,
    /// Terminal value produced by `return`; once set, every enclosing
    /// sequence and loop unwinds.
    pub output: Option<Value>,

    fuel: i64,
    fuel_used: u64,
    frames: Vec<HashMap<String, Value>>,
}

impl RuntimeContext {
    pub fn new(
        args: HashMap<String, Value>,
        capabilities: Capabilities,
        registry: Arc<AtomRegistry>,
        fuel: u64,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::now_v7().to_string(),
            args,
            capabilities,
            registry,
            output: None,
            fuel: fuel as i64,
            fuel_used: 0,
            frames: vec![HashMap::new()],
        }
    }

    /// Charges one unit of fuel for a step about to run.
    pub fn consume_fuel(&mut self) -> VmResult<()> {
        self.fuel -= 1;
        if self.fuel < 0 {
            return Err(VmError::OutOfFuel {
                used: self.fuel_used,
            });
        }
        self.fuel_used += 1;
        Ok(())
    }

    /// True when no budget remains for another step.
    pub fn fuel_exhausted(&self) -> bool {
        self.fuel <= 0
    }

    /// Steps charged so far.
    pub fn fuel_used(&self) -> u64 {
        self.fuel_used
    }

    /// Remaining budget.
    pub fn fuel_remaining(&self) -> i64 {
        self.fuel
    }

    /// Reads a variable, falling through to enclosing scopes.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Reads a variable from the current scope only, without fallthrough.
    pub fn get_local(&self, name: &str) -> Option<&Value> {
        self.frames.last().and_then(|frame| frame.get(name))
    }

    /// Binds a variable in the current scope.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Replaces a variable wherever it is bound, for interior mutation of an
    /// existing value. Returns false when the name is unbound everywhere.
    pub fn replace(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    /// Enters a child scope.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leaves the current scope, discarding its bindings. The root frame is
    /// never popped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Scope nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_fuel(fuel: u64) -> RuntimeContext {
        RuntimeContext::new(
            HashMap::new(),
            Capabilities::new(),
            Arc::new(AtomRegistry::new()),
            fuel,
        )
    }

    #[test]
    fn test_fuel_accounting() {
        let mut ctx = ctx_with_fuel(2);
        assert!(ctx.consume_fuel().is_ok());
        assert!(ctx.consume_fuel().is_ok());
        assert_eq!(ctx.fuel_used(), 2);
        assert!(ctx.fuel_exhausted());

        let err = ctx.consume_fuel().unwrap_err();
        assert!(matches!(err, VmError::OutOfFuel { used: 2 }));
        // The failed step is not counted as used.
        assert_eq!(ctx.fuel_used(), 2);
    }

    #[test]
    fn test_scope_fallthrough_reads() {
        let mut ctx = ctx_with_fuel(10);
        ctx.set("x", Value::from(1i64));
        ctx.push_frame();

        assert_eq!(ctx.get("x"), Some(&Value::from(1i64)));
        assert_eq!(ctx.get_local("x"), None);
    }

    #[test]
    fn test_writes_stay_local() {
        let mut ctx = ctx_with_fuel(10);
        ctx.set("x", Value::from(1i64));
        ctx.push_frame();
        ctx.set("x", Value::from(2i64));
        ctx.set("y", Value::from(9i64));

        assert_eq!(ctx.get("x"), Some(&Value::from(2i64)));
        ctx.pop_frame();
        assert_eq!(ctx.get("x"), Some(&Value::from(1i64)));
        assert_eq!(ctx.get("y"), None);
    }

    #[test]
    fn test_nearest_binding_shadows() {
        let mut ctx = ctx_with_fuel(10);
        ctx.set("x", Value::from("outer"));
        ctx.push_frame();
        ctx.set("x", Value::from("mid"));
        ctx.push_frame();

        assert_eq!(ctx.get("x"), Some(&Value::from("mid")));
    }

    #[test]
    fn test_replace_hits_owning_frame() {
        let mut ctx = ctx_with_fuel(10);
        ctx.set("xs", Value::Array(vec![]));
        ctx.push_frame();

        assert!(ctx.replace("xs", Value::Array(vec![Value::from(1i64)])));
        ctx.pop_frame();
        assert_eq!(
            ctx.get("xs"),
            Some(&Value::Array(vec![Value::from(1i64)]))
        );

        assert!(!ctx.replace("unbound", Value::Null));
    }

    #[test]
    fn test_root_frame_is_never_popped() {
        let mut ctx = ctx_with_fuel(10);
        ctx.pop_frame();
        assert_eq!(ctx.depth(), 1);
        ctx.set("x", Value::Null);
        assert!(ctx.get("x").is_some());
    }
}
