//! Reagent Core - shared types for the Reagent agent virtual machine.
//!
//! This crate provides the dynamic value model, the AST node type that agent
//! programs are built from, the error surface of the VM, and a thin wrapper
//! around JSON Schema validation.

pub mod error;
pub mod schema;
pub mod types;

pub use error::{VmError, VmResult};
pub use schema::{JsonSchema, object_properties};
pub use types::{Number, Step, Value};
