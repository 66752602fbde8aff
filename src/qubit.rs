//! The qubit capability interface.
//!
//! A [`Qubit`] is an opaque handle to one two-level system, simulated or
//! physical. It exposes a deliberately small single-qubit vocabulary:
//!
//! | Method | Effect | Returns |
//! |--------|--------|---------|
//! | `h()` | Hadamard-equivalent basis change | `QubitResult<()>` |
//! | `x()` | Bit flip | `QubitResult<()>` |
//! | `ry(angle)` | Rotation about Y by `angle` radians | `QubitResult<()>` |
//! | `measure()` | Collapse to a classical outcome | `QubitResult<bool>` |
//! | `reset()` | Return to logical zero (idempotent) | `QubitResult<()>` |
//!
//! Handles are produced by [`QuantumDevice::allocate_qubit`] and become
//! invalid once passed to [`QuantumDevice::deallocate_qubit`].
//!
//! [`QuantumDevice::allocate_qubit`]: crate::QuantumDevice::allocate_qubit
//! [`QuantumDevice::deallocate_qubit`]: crate::QuantumDevice::deallocate_qubit

use crate::error::QubitResult;

/// Trait for qubit handles.
///
/// # Contract
///
/// - Every operation acts on the receiver only; the interface is
///   single-qubit.
/// - `ry()` MUST accept any finite angle, reducing it modulo the rotation's
///   period.
/// - `reset()` MUST be deterministic and idempotent: afterwards the qubit
///   behaves as if freshly prepared in logical zero.
/// - Repeatability of `measure()` is device-defined and documented through
///   [`Capabilities::measurement`](crate::Capabilities::measurement).
/// - Operations on a deallocated handle SHOULD fail with
///   [`QubitError::InvalidState`](crate::QubitError::InvalidState) rather
///   than act on stale state.
pub trait Qubit: Send {
    /// Apply a Hadamard-equivalent operation.
    fn h(&mut self) -> QubitResult<()>;

    /// Apply a bit flip.
    fn x(&mut self) -> QubitResult<()>;

    /// Rotate about the Y axis by `angle` radians.
    fn ry(&mut self, angle: f64) -> QubitResult<()>;

    /// Measure the qubit, returning `true` for logical one.
    fn measure(&mut self) -> QubitResult<bool>;

    /// Return the qubit to logical zero.
    fn reset(&mut self) -> QubitResult<()>;
}

impl<Q: Qubit + ?Sized> Qubit for Box<Q> {
    fn h(&mut self) -> QubitResult<()> {
        (**self).h()
    }

    fn x(&mut self) -> QubitResult<()> {
        (**self).x()
    }

    fn ry(&mut self, angle: f64) -> QubitResult<()> {
        (**self).ry(angle)
    }

    fn measure(&mut self) -> QubitResult<bool> {
        (**self).measure()
    }

    fn reset(&mut self) -> QubitResult<()> {
        (**self).reset()
    }
}
