//! Qubit Contract — capability interface and scoped resource lifecycle for quantum devices
//!
//! This crate draws the boundary between quantum-program logic and whatever
//! executes it. Any backend — statevector simulator, hardware driver, test
//! double — implements [`Qubit`] and [`QuantumDevice`]; program logic only
//! ever talks to those two traits.
//!
//! # Overview
//!
//! The contract defines:
//! - A [`Qubit`] trait with the single-qubit vocabulary `h`, `x`, `ry`,
//!   `measure` and `reset`
//! - A [`QuantumDevice`] trait that allocates and reclaims qubits
//! - [`ScopedQubit`] / [`QuantumDevice::with_qubit`] for scoped acquisition
//! - [`Capabilities`] and [`DeviceAvailability`] for device introspection
//! - [`QubitId`] / [`QubitStatus`] for the handle lifecycle
//! - [`QubitError`] with categorized error variants
//!
//! A reference [`SimulatorDevice`] and the [`sample`] helper are included.
//!
//! # Scoped acquisition
//!
//! ```
//! use qubit_contract::{QuantumDevice, Qubit, SimulatorDevice};
//!
//! let device = SimulatorDevice::new(1);
//! let flipped = device.with_qubit(|q| {
//!     q.x()?;
//!     q.measure()
//! })?;
//! assert!(flipped);
//!
//! // The qubit was reset and handed back.
//! assert_eq!(device.availability().allocated, 0);
//! # Ok::<(), qubit_contract::QubitError>(())
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!   allocate_qubit() ──→ h/x/ry/measure ──→ reset() ──→ deallocate_qubit()
//!    Unallocated→InUse        InUse           →Clean       →Unallocated
//! ```

pub mod capability;
pub mod config;
pub mod device;
pub mod error;
pub mod lifecycle;
pub mod qubit;
pub mod result;
pub mod simulator;

pub use capability::{Capabilities, DeviceAvailability, ExhaustionPolicy, MeasurementPolicy};
pub use config::SimulatorConfig;
pub use device::{QuantumDevice, ScopedQubit};
pub use error::{QubitError, QubitResult};
pub use lifecycle::{QubitId, QubitStatus};
pub use qubit::Qubit;
pub use result::{Counts, sample};
pub use simulator::{SimulatedQubit, SimulatorDevice};
