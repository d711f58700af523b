//! Runtime configuration.

use reagent_backends::Capabilities;
use serde::{Deserialize, Serialize};

/// Per-run options handed to [`crate::Vm::run`].
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Step budget for the run. Falls back to [`VmConfig::default_fuel`].
    pub fuel: Option<u64>,
    /// Host effects available to the program.
    pub capabilities: Capabilities,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fuel budget.
    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = Some(fuel);
        self
    }

    /// Sets the capability bag.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// VM-wide configuration. Hosts typically deserialize this from their own
/// config file; the defaults are safe for embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Fuel budget used when a run does not specify one.
    pub default_fuel: u64,
    /// Timeout for atoms that invoke capabilities, in milliseconds.
    pub io_timeout_ms: u64,
    /// Timeout for pure compute atoms, in milliseconds.
    pub compute_timeout_ms: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            default_fuel: 1000,
            io_timeout_ms: 30_000,
            compute_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VmConfig::default();
        assert_eq!(config.default_fuel, 1000);
        assert_eq!(config.io_timeout_ms, 30_000);
        assert_eq!(config.compute_timeout_ms, 5_000);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: VmConfig = serde_json::from_str(r#"{"default_fuel": 50}"#).unwrap();
        assert_eq!(config.default_fuel, 50);
        assert_eq!(config.io_timeout_ms, 30_000);
    }

    #[test]
    fn test_run_options_builder() {
        let options = RunOptions::new().with_fuel(10);
        assert_eq!(options.fuel, Some(10));
    }
}
