//! Qubit contract error types.
//!
//! The contract itself declares no failures; these are the errors concrete
//! devices and qubits raise when the contract is exercised:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Resource** | `ResourceExhausted` | Release a qubit or retry later |
//! | **Contract violation** | `InvalidHandle`, `InvalidState` | Fix the caller |
//! | **Input** | `InvalidArgument`, `Unsupported` | Fix input or choose another device |
//! | **Config** | `Configuration` | Fix configuration |
//! | **Backend** | `Backend` | Device-specific |

use thiserror::Error;

/// Errors that can occur while allocating, operating on, or releasing qubits.
///
/// Implementations may wrap additional device-specific errors in the
/// `Backend` variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QubitError {
    // ── Resource errors ──────────────────────────────────────────────
    /// No qubit resource is available and the device does not grow.
    #[error("No qubit available: {0}")]
    ResourceExhausted(String),

    // ── Contract violations ──────────────────────────────────────────
    /// Deallocation of a qubit this device does not own, or owns no longer.
    #[error("Invalid qubit handle: {0}")]
    InvalidHandle(String),

    /// Operation on a qubit handle that has already been deallocated.
    #[error("Invalid qubit state: {0}")]
    InvalidState(String),

    // ── Input errors ─────────────────────────────────────────────────
    /// Invalid operation argument (e.g. a non-finite rotation angle).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not supported by this device.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // ── Config errors ────────────────────────────────────────────────
    /// Configuration error (fix configuration).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic device error, e.g. a hardware fault.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl QubitError {
    /// Returns `true` if the caller broke the allocate/deallocate contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidHandle(_) | Self::InvalidState(_))
    }

    /// Returns `true` if the operation may succeed once resources free up.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }
}

impl From<serde_json::Error> for QubitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for qubit and device operations.
pub type QubitResult<T> = Result<T, QubitError>;
