//! Reagent Runtime - an embeddable virtual machine for declarative agent
//! programs.
//!
//! A program is a JSON tree of typed operations ("atoms") combined by flow
//! atoms. The VM executes it under a step budget (fuel), per-atom timeouts,
//! and lexically scoped state, dispatching host effects through the
//! capability traits of `reagent-backends`.
//!
//! ```no_run
//! use reagent_runtime::{RunOptions, Step, Vm};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let program = Step::from_json(&json!({
//!     "op": "seq",
//!     "steps": [
//!         {"op": "var.set", "key": "greeting", "value": "hello"},
//!         {"op": "return", "schema": {"properties": {"greeting": {}}}}
//!     ]
//! }))?;
//!
//! let vm = Vm::new()?;
//! let outcome = vm.run(&program, HashMap::new(), RunOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod atom;
pub mod atoms;
pub mod config;
pub mod context;
pub mod executor;
pub mod expr;
pub mod registry;
pub mod resolver;
pub mod vm;

pub use atom::{Atom, AtomSpec};
pub use config::{RunOptions, VmConfig};
pub use context::RuntimeContext;
pub use registry::AtomRegistry;
pub use vm::{RunOutcome, Vm};

pub use reagent_backends::Capabilities;
pub use reagent_core::{Number, Step, Value, VmError, VmResult};
