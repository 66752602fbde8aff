//! Simulator device configuration.

use serde::{Deserialize, Serialize};

use crate::capability::{ExhaustionPolicy, MeasurementPolicy};
use crate::error::{QubitError, QubitResult};

/// Configuration for [`SimulatorDevice`](crate::SimulatorDevice).
///
/// Every field has a default, so partial JSON is accepted:
///
/// ```
/// use qubit_contract::{ExhaustionPolicy, SimulatorConfig};
///
/// let config = SimulatorConfig::from_json(r#"{ "num_qubits": 4, "exhaustion": "grow" }"#)?;
/// assert_eq!(config.num_qubits, 4);
/// assert_eq!(config.exhaustion, ExhaustionPolicy::Grow);
/// # Ok::<(), qubit_contract::QubitError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Name reported by the device.
    pub name: String,
    /// Size of the initial qubit pool.
    pub num_qubits: u32,
    /// What `allocate_qubit` does once the pool is empty.
    pub exhaustion: ExhaustionPolicy,
    /// Post-measurement behaviour.
    pub measurement: MeasurementPolicy,
    /// Reset qubits to |0⟩ when they are handed out.
    pub reset_on_allocate: bool,
    /// Seed for measurement sampling; entropy-seeded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            name: "simulator".into(),
            num_qubits: 1,
            exhaustion: ExhaustionPolicy::Fail,
            measurement: MeasurementPolicy::Collapse,
            reset_on_allocate: false,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Create a configuration with `num_qubits` pooled qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> QubitResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a usable device.
    pub fn validate(&self) -> QubitResult<()> {
        if self.name.trim().is_empty() {
            return Err(QubitError::Configuration("device name is empty".into()));
        }
        if self.num_qubits == 0 && self.exhaustion == ExhaustionPolicy::Fail {
            return Err(QubitError::Configuration(
                "num_qubits must be at least 1 unless the pool can grow".into(),
            ));
        }
        Ok(())
    }

    /// Set the device name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the exhaustion policy.
    pub fn with_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    /// Set the measurement policy.
    pub fn with_measurement(mut self, policy: MeasurementPolicy) -> Self {
        self.measurement = policy;
        self
    }

    /// Reset qubits when they are allocated.
    pub fn with_reset_on_allocate(mut self, reset: bool) -> Self {
        self.reset_on_allocate = reset;
        self
    }

    /// Fix the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.num_qubits, 1);
        assert_eq!(config.exhaustion, ExhaustionPolicy::Fail);
        assert_eq!(config.measurement, MeasurementPolicy::Collapse);
        assert!(!config.reset_on_allocate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            SimulatorConfig::from_json(r#"{ "measurement": "reprepare", "seed": 7 }"#).unwrap();
        assert_eq!(config.measurement, MeasurementPolicy::Reprepare);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.name, "simulator");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SimulatorConfig::from_json(r#"{ "num_qubits": "many" }"#).unwrap_err();
        assert!(matches!(err, QubitError::Configuration(_)));
    }

    #[test]
    fn test_empty_fixed_pool_is_invalid() {
        let config = SimulatorConfig::new(0);
        assert!(matches!(
            config.validate(),
            Err(QubitError::Configuration(_))
        ));
        assert!(
            SimulatorConfig::new(0)
                .with_exhaustion(ExhaustionPolicy::Grow)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = SimulatorConfig::new(3).with_name("bench").with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimulatorConfig::from_json(&json).unwrap(), config);
    }
}
