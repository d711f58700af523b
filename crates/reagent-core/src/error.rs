//! Error surface of the agent VM.
//!
//! Every error carries a single human-readable message whose prefix names the
//! kind, so hosts can classify failures without matching on variants.

use thiserror::Error;

/// Errors surfaced while loading or executing an agent program.
#[derive(Debug, Error)]
pub enum VmError {
    /// An atom's input failed its declared schema.
    #[error("ValidationError: input for '{op}' rejected: {detail}")]
    Validation {
        /// Op code of the atom whose input was rejected.
        op: String,
        /// Validation failure detail, including the offending payload.
        detail: String,
    },

    /// An atom exceeded its per-dispatch timeout.
    #[error("TimeoutError: atom '{op}' exceeded {timeout_ms}ms")]
    Timeout {
        /// Op code of the atom that timed out.
        op: String,
        /// Timeout that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// The fuel budget was exhausted before a step could run.
    #[error("OutOfFuel: budget exhausted after {used} steps")]
    OutOfFuel {
        /// Steps dispatched before exhaustion.
        used: u64,
    },

    /// A step referenced an op not present in the registry.
    #[error("UnknownAtom: no atom registered for op '{op}'")]
    UnknownAtom {
        /// The unresolved op code.
        op: String,
    },

    /// An atom required a capability the host did not provide.
    #[error("MissingCapability: '{name}' was not provided by the host")]
    MissingCapability {
        /// Name of the missing capability.
        name: String,
    },

    /// The root AST node is not a `seq`.
    #[error("BadRoot: root step must be 'seq', got '{op}'")]
    BadRoot {
        /// Op code found at the root.
        op: String,
    },

    /// A malformed expression in the evaluator.
    #[error("ExprError: {0}")]
    Expr(String),

    /// A capability invocation failed.
    #[error("CapabilityError: '{name}' failed: {message}")]
    Capability {
        /// Name of the capability that failed.
        name: String,
        /// Failure detail from the capability implementation.
        message: String,
    },

    /// An AST node could not be interpreted as a step.
    #[error("MalformedStep: {0}")]
    MalformedStep(String),

    /// A value could not cross the JSON boundary.
    #[error("SerializationError: {0}")]
    Serialization(String),
}

impl VmError {
    /// Fatal errors unwind through `try`/`catch` instead of being handled.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VmError::OutOfFuel { .. } | VmError::BadRoot { .. })
    }
}

/// Result alias used throughout the VM.
pub type VmResult<T> = Result<T, VmError>;
