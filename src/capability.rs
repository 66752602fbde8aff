//! Device capability introspection.
//!
//! These types describe how a quantum device honours the parts of the
//! contract it is free to choose: what happens when the pool runs dry,
//! and whether measurement collapses the qubit. Callers use them to pick
//! a device; tests use [`DeviceAvailability`] to observe pool state.

use serde::{Deserialize, Serialize};

/// Behaviour of `allocate_qubit` when no idle qubit is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Fail with `QubitError::ResourceExhausted`.
    #[default]
    Fail,
    /// Create a fresh qubit and grow the pool.
    Grow,
}

/// What a device does to the qubit state when it is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementPolicy {
    /// The state collapses to the observed eigenstate; repeated
    /// measurements without gates in between return the same outcome.
    #[default]
    Collapse,
    /// The prepared state is left intact; repeated measurements are
    /// independent samples of it.
    Reprepare,
}

/// Capabilities of a quantum device.
///
/// Cached at construction time and returned by reference from
/// [`QuantumDevice::capabilities`](crate::QuantumDevice::capabilities).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the device.
    pub name: String,
    /// Number of qubits in the initial pool.
    pub num_qubits: u32,
    /// Whether this is a simulator (not real hardware).
    pub is_simulator: bool,
    /// Allocation behaviour when the pool is empty.
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
    /// Post-measurement behaviour.
    #[serde(default)]
    pub measurement: MeasurementPolicy,
    /// Qubit operations the device implements.
    pub operations: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a simulator implementing every operation.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            is_simulator: true,
            exhaustion: ExhaustionPolicy::Fail,
            measurement: MeasurementPolicy::Collapse,
            operations: ["h", "x", "ry", "measure", "reset"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Override the device name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the exhaustion policy.
    pub fn with_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    /// Override the measurement policy.
    pub fn with_measurement(mut self, policy: MeasurementPolicy) -> Self {
        self.measurement = policy;
        self
    }

    /// Restrict the operation list.
    pub fn with_operations<S: Into<String>>(mut self, ops: impl IntoIterator<Item = S>) -> Self {
        self.operations = ops.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an operation is supported.
    pub fn supports(&self, op: &str) -> bool {
        self.operations.iter().any(|o| o == op)
    }
}

/// Snapshot of a device's qubit pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAvailability {
    /// Number of qubits currently held by callers.
    pub allocated: u32,
    /// Number of qubits that can still be allocated, `None` if unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
}

impl DeviceAvailability {
    /// Availability for a pool with a fixed number of idle qubits.
    pub fn bounded(allocated: u32, available: u32) -> Self {
        Self {
            allocated,
            available: Some(available),
        }
    }

    /// Availability for a pool that grows on demand.
    pub fn unbounded(allocated: u32) -> Self {
        Self {
            allocated,
            available: None,
        }
    }

    /// Whether `allocate_qubit` is expected to succeed right now.
    pub fn can_allocate(&self) -> bool {
        self.available.is_none_or(|n| n > 0)
    }
}
