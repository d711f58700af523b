//! VM orchestrator.
//!
//! Composes the atom registry, builds the per-run context, dispatches the
//! root sequence, and reports the outcome together with the fuel spent.

use crate::atom::Atom;
use crate::config::{RunOptions, VmConfig};
use crate::context::RuntimeContext;
use crate::executor;
use crate::registry::AtomRegistry;
use reagent_core::{Step, Value, VmError, VmResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Root atoms must be sequences.
const ROOT_OP: &str = "seq";

/// Result of one agent run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    /// Terminal value produced by `return`, if the program returned.
    pub output: Option<Value>,
    /// Steps charged against the fuel budget.
    pub fuel_used: u64,
}

/// The agent virtual machine.
///
/// Holds the atom registry, which is read-only after construction, so one
/// `Vm` can serve many concurrent runs; each run owns its own context.
pub struct Vm {
    registry: Arc<AtomRegistry>,
    config: VmConfig,
}

impl Vm {
    /// Creates a VM with the default configuration and the built-in atoms.
    pub fn new() -> VmResult<Self> {
        Self::with_config(VmConfig::default())
    }

    /// Creates a VM with the given configuration and the built-in atoms.
    pub fn with_config(config: VmConfig) -> VmResult<Self> {
        let registry = AtomRegistry::with_builtins(&config)?;
        Ok(Self {
            registry: Arc::new(registry),
            config,
        })
    }

    /// Creates a VM with custom atoms overlaid on the built-ins. A custom
    /// atom that reuses a built-in op code replaces it.
    pub fn with_custom_atoms(config: VmConfig, atoms: Vec<Arc<dyn Atom>>) -> VmResult<Self> {
        let registry = AtomRegistry::with_builtins(&config)?;
        for atom in atoms {
            registry.register(atom);
        }
        Ok(Self {
            registry: Arc::new(registry),
            config,
        })
    }

    /// The atom registry, for host-side introspection.
    pub fn registry(&self) -> &AtomRegistry {
        &self.registry
    }

    /// Executes a program.
    pub async fn run(
        &self,
        program: &Step,
        args: HashMap<String, Value>,
        options: RunOptions,
    ) -> VmResult<RunOutcome> {
        if program.op != ROOT_OP {
            return Err(VmError::BadRoot {
                op: program.op.clone(),
            });
        }

        let fuel = options.fuel.unwrap_or(self.config.default_fuel);
        let mut ctx = RuntimeContext::new(
            args,
            options.capabilities,
            Arc::clone(&self.registry),
            fuel,
        );

        tracing::debug!(run_id = %ctx.run_id, fuel, "starting agent run");
        let result = executor::execute_step(program, &mut ctx).await;
        match &result {
            Ok(()) => {
                tracing::debug!(
                    run_id = %ctx.run_id,
                    fuel_used = ctx.fuel_used(),
                    returned = ctx.output.is_some(),
                    "agent run finished"
                );
            }
            Err(err) => {
                tracing::warn!(run_id = %ctx.run_id, error = %err, "agent run failed");
            }
        }
        result?;

        Ok(RunOutcome {
            output: ctx.output.take(),
            fuel_used: ctx.fuel_used(),
        })
    }

    /// Parses a JSON program and executes it.
    pub async fn run_json(
        &self,
        program: &serde_json::Value,
        args: HashMap<String, Value>,
        options: RunOptions,
    ) -> VmResult<RunOutcome> {
        let root = Step::from_json(program)?;
        self.run(&root, args, options).await
    }
}
