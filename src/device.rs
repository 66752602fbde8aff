//! Quantum device trait and scoped qubit acquisition.
//!
//! The [`QuantumDevice`] trait is the resource manager behind every
//! [`Qubit`] handle:
//!
//! ```text
//!   allocate_qubit() ──→ h/x/ry/measure ──→ reset() ──→ deallocate_qubit()
//!    (exclusive)           (caller)         (scoped)      (exactly once)
//! ```
//!
//! ## Method table
//!
//! | Method | Required | Returns |
//! |--------|----------|---------|
//! | `name()` | yes | `&str` |
//! | `capabilities()` | yes | `&Capabilities` |
//! | `availability()` | yes | `DeviceAvailability` |
//! | `allocate_qubit()` | yes | `QubitResult<Self::Qubit>` |
//! | `deallocate_qubit()` | yes | `QubitResult<()>` |
//! | `using_qubit()` | provided | `QubitResult<ScopedQubit<'_, Self>>` |
//! | `with_qubit()` | provided | `Result<T, E>` |
//!
//! ## Scoped acquisition
//!
//! [`ScopedQubit`] resets and then deallocates its qubit when it goes out
//! of scope, on every exit path including `?` and panics. Deallocation is
//! attempted even when the reset fails. [`QuantumDevice::with_qubit`] is
//! the closure form: the body's own error always wins over cleanup errors.

use std::ops::{Deref, DerefMut};

use tracing::{debug, error, warn};

use crate::capability::{Capabilities, DeviceAvailability};
use crate::error::{QubitError, QubitResult};
use crate::qubit::Qubit;

/// Trait for quantum devices.
///
/// # Contract
///
/// - `capabilities()` MUST be synchronous and infallible, cached at
///   construction time.
/// - `allocate_qubit()` grants exclusive use of one qubit until it is
///   deallocated. The returned qubit is in *some* defined state, not
///   necessarily logical zero. Behaviour on an empty pool follows
///   `capabilities().exhaustion`.
/// - `deallocate_qubit()` MUST fail with [`QubitError::InvalidHandle`] when
///   the qubit was not allocated by this device or was already released.
///   It MUST NOT reset the qubit on the caller's behalf unless documented.
/// - Sharing one device between threads is the implementation's
///   responsibility; the `Send + Sync` bound makes it possible.
pub trait QuantumDevice: Send + Sync {
    /// Qubit handle type produced by this device.
    type Qubit: Qubit;

    /// Get the name of this device.
    fn name(&self) -> &str;

    /// Get the capabilities of this device.
    fn capabilities(&self) -> &Capabilities;

    /// Snapshot of the device's qubit pool.
    fn availability(&self) -> DeviceAvailability;

    /// Obtain exclusive use of one qubit.
    fn allocate_qubit(&self) -> QubitResult<Self::Qubit>;

    /// Return a previously allocated qubit to the device.
    fn deallocate_qubit(&self, qubit: Self::Qubit) -> QubitResult<()>;

    /// Allocate a qubit that is reset and released when the guard drops.
    fn using_qubit(&self) -> QubitResult<ScopedQubit<'_, Self>> {
        let qubit = self.allocate_qubit()?;
        debug!("Scoped qubit acquired on {}", self.name());
        Ok(ScopedQubit::new(self, qubit))
    }

    /// Run `body` with a scoped qubit.
    ///
    /// Cleanup runs whatever `body` returns. An error from `body` is
    /// returned unchanged and cleanup failures are only logged; if `body`
    /// succeeds, a cleanup failure is returned instead of its value.
    fn with_qubit<T, E, F>(&self, body: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self::Qubit) -> Result<T, E>,
        E: From<QubitError>,
    {
        let mut scoped = self.using_qubit()?;
        match body(&mut *scoped) {
            Ok(value) => {
                scoped.release()?;
                Ok(value)
            }
            Err(err) => {
                drop(scoped);
                Err(err)
            }
        }
    }
}

/// A qubit borrowed from a device for the lifetime of this guard.
///
/// Dereferences to the device's qubit type. Dropping the guard resets the
/// qubit and hands it back; use [`ScopedQubit::release`] to observe
/// cleanup errors instead of having them logged.
///
/// Guards are only built by [`QuantumDevice::using_qubit`], so the qubit
/// always goes back to the device that allocated it:
///
/// ```compile_fail
/// use qubit_contract::{QuantumDevice, ScopedQubit, SimulatorDevice};
///
/// let a = SimulatorDevice::new(1);
/// let b = SimulatorDevice::new(1);
/// let q = a.allocate_qubit().unwrap();
/// let _guard = ScopedQubit::new(&b, q);
/// ```
pub struct ScopedQubit<'d, D: QuantumDevice + ?Sized> {
    device: &'d D,
    qubit: Option<D::Qubit>,
}

impl<'d, D: QuantumDevice + ?Sized> ScopedQubit<'d, D> {
    /// Wrap a qubit just allocated from `device`.
    fn new(device: &'d D, qubit: D::Qubit) -> Self {
        Self {
            device,
            qubit: Some(qubit),
        }
    }

    /// The device this qubit is borrowed from.
    pub fn device(&self) -> &'d D {
        self.device
    }

    /// Reset and deallocate now, returning the first cleanup error.
    pub fn release(mut self) -> QubitResult<()> {
        match self.qubit.take() {
            Some(qubit) => release_qubit(self.device, qubit),
            None => Ok(()),
        }
    }
}

impl<D: QuantumDevice + ?Sized> Deref for ScopedQubit<'_, D> {
    type Target = D::Qubit;

    fn deref(&self) -> &Self::Target {
        self.qubit
            .as_ref()
            .expect("scoped qubit is present until the guard is consumed")
    }
}

impl<D: QuantumDevice + ?Sized> DerefMut for ScopedQubit<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.qubit
            .as_mut()
            .expect("scoped qubit is present until the guard is consumed")
    }
}

impl<D: QuantumDevice + ?Sized> Drop for ScopedQubit<'_, D> {
    fn drop(&mut self) {
        if let Some(qubit) = self.qubit.take() {
            if let Err(err) = release_qubit(self.device, qubit) {
                error!("Scoped qubit cleanup on {} failed: {}", self.device.name(), err);
            }
        }
    }
}

/// Reset then deallocate. Deallocation runs even if the reset failed.
fn release_qubit<D: QuantumDevice + ?Sized>(device: &D, mut qubit: D::Qubit) -> QubitResult<()> {
    let reset = qubit.reset();
    if let Err(err) = &reset {
        warn!("Reset failed before release on {}: {}", device.name(), err);
    }

    let released = device.deallocate_qubit(qubit);

    match (reset, released) {
        (Ok(()), Ok(())) => {
            debug!("Scoped qubit released on {}", device.name());
            Ok(())
        }
        (Ok(()), Err(release_err)) => Err(release_err),
        (Err(reset_err), Ok(())) => Err(reset_err),
        (Err(reset_err), Err(release_err)) => {
            error!(
                "Deallocation on {} failed after failed reset: {}",
                device.name(),
                release_err
            );
            Err(reset_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::{Arc, Mutex};

    use rustc_hash::FxHashSet;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Allocate(u32),
        Gate(&'static str, u32),
        Reset(u32),
        Deallocate(u32),
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    #[derive(Clone)]
    struct RecordingQubit {
        device: u32,
        id: u32,
        one: bool,
        fail_reset: bool,
        log: Log,
    }

    impl RecordingQubit {
        fn record(&self, event: Event) {
            self.log.lock().unwrap().push(event);
        }
    }

    impl Qubit for RecordingQubit {
        fn h(&mut self) -> QubitResult<()> {
            self.record(Event::Gate("h", self.id));
            Ok(())
        }

        fn x(&mut self) -> QubitResult<()> {
            self.record(Event::Gate("x", self.id));
            self.one = !self.one;
            Ok(())
        }

        fn ry(&mut self, _angle: f64) -> QubitResult<()> {
            self.record(Event::Gate("ry", self.id));
            Ok(())
        }

        fn measure(&mut self) -> QubitResult<bool> {
            self.record(Event::Gate("measure", self.id));
            Ok(self.one)
        }

        fn reset(&mut self) -> QubitResult<()> {
            self.record(Event::Reset(self.id));
            if self.fail_reset {
                return Err(QubitError::Backend("reset pulse failed".into()));
            }
            self.one = false;
            Ok(())
        }
    }

    struct RecordingDevice {
        id: u32,
        capabilities: Capabilities,
        free: Mutex<Vec<u32>>,
        live: Mutex<FxHashSet<u32>>,
        fail_reset: bool,
        log: Log,
    }

    impl RecordingDevice {
        fn new(id: u32, num_qubits: u32) -> Self {
            Self {
                id,
                capabilities: Capabilities::simulator(num_qubits).with_name("recording"),
                free: Mutex::new((0..num_qubits).rev().collect()),
                live: Mutex::new(FxHashSet::default()),
                fail_reset: false,
                log: Arc::default(),
            }
        }

        fn failing_reset(mut self) -> Self {
            self.fail_reset = true;
            self
        }

        fn events(&self) -> Vec<Event> {
            self.log.lock().unwrap().clone()
        }

        fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
            self.events().iter().filter(|e| pred(*e)).count()
        }
    }

    impl QuantumDevice for RecordingDevice {
        type Qubit = RecordingQubit;

        fn name(&self) -> &str {
            &self.capabilities.name
        }

        fn capabilities(&self) -> &Capabilities {
            &self.capabilities
        }

        fn availability(&self) -> DeviceAvailability {
            let allocated = self.live.lock().unwrap().len() as u32;
            let available = self.free.lock().unwrap().len() as u32;
            DeviceAvailability::bounded(allocated, available)
        }

        fn allocate_qubit(&self) -> QubitResult<RecordingQubit> {
            let id = self
                .free
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| QubitError::ResourceExhausted("recording pool empty".into()))?;
            self.live.lock().unwrap().insert(id);
            self.log.lock().unwrap().push(Event::Allocate(id));
            Ok(RecordingQubit {
                device: self.id,
                id,
                one: false,
                fail_reset: self.fail_reset,
                log: Arc::clone(&self.log),
            })
        }

        fn deallocate_qubit(&self, qubit: RecordingQubit) -> QubitResult<()> {
            if qubit.device != self.id || !self.live.lock().unwrap().remove(&qubit.id) {
                return Err(QubitError::InvalidHandle(format!("q{}", qubit.id)));
            }
            self.free.lock().unwrap().push(qubit.id);
            self.log.lock().unwrap().push(Event::Deallocate(qubit.id));
            Ok(())
        }
    }

    #[derive(Debug)]
    enum ProgramError {
        Aborted,
        Qubit(QubitError),
    }

    impl From<QubitError> for ProgramError {
        fn from(err: QubitError) -> Self {
            Self::Qubit(err)
        }
    }

    #[test]
    fn test_scoped_success_resets_then_releases() {
        let device = RecordingDevice::new(0, 1);
        let outcome = device
            .with_qubit(|q| {
                q.x()?;
                q.measure()
            })
            .unwrap();

        assert!(outcome);
        assert_eq!(
            device.events(),
            vec![
                Event::Allocate(0),
                Event::Gate("x", 0),
                Event::Gate("measure", 0),
                Event::Reset(0),
                Event::Deallocate(0),
            ]
        );
        assert_eq!(device.availability(), DeviceAvailability::bounded(0, 1));
    }

    #[test]
    fn test_failing_body_still_cleans_up() {
        let device = RecordingDevice::new(0, 1);
        let result: Result<(), ProgramError> = device.with_qubit(|q| {
            q.h()?;
            Err(ProgramError::Aborted)
        });

        assert!(matches!(result, Err(ProgramError::Aborted)));
        assert_eq!(device.count(|e| matches!(e, Event::Reset(_))), 1);
        assert_eq!(
            &device.events()[2..],
            &[Event::Reset(0), Event::Deallocate(0)]
        );
        assert_eq!(device.availability(), DeviceAvailability::bounded(0, 1));
    }

    #[test]
    fn test_failing_reset_still_deallocates() {
        let device = RecordingDevice::new(0, 1).failing_reset();
        let result = device.with_qubit(|q| q.x());

        assert!(matches!(result, Err(QubitError::Backend(_))));
        assert_eq!(device.count(|e| matches!(e, Event::Deallocate(0))), 1);
        assert!(device.availability().can_allocate());
    }

    #[test]
    fn test_body_error_wins_over_reset_error() {
        let device = RecordingDevice::new(0, 1).failing_reset();
        let result: Result<(), ProgramError> = device.with_qubit(|_| Err(ProgramError::Aborted));

        assert!(matches!(result, Err(ProgramError::Aborted)));
        assert_eq!(device.count(|e| matches!(e, Event::Deallocate(0))), 1);
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn bail() -> QubitResult<()> {
            Err(QubitError::Unsupported("bail".into()))
        }

        fn flip_then_bail(device: &RecordingDevice) -> QubitResult<bool> {
            let mut q = device.using_qubit()?;
            q.x()?;
            bail()?;
            q.measure()
        }

        let device = RecordingDevice::new(0, 1);
        assert!(flip_then_bail(&device).is_err());
        assert_eq!(
            device.events(),
            vec![
                Event::Allocate(0),
                Event::Gate("x", 0),
                Event::Reset(0),
                Event::Deallocate(0),
            ]
        );
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let device = RecordingDevice::new(0, 1);
        let caught = catch_unwind(AssertUnwindSafe(|| {
            device
                .with_qubit(|q| -> QubitResult<()> {
                    q.h()?;
                    panic!("program bug");
                })
                .ok();
        }));

        assert!(caught.is_err());
        assert_eq!(device.count(|e| matches!(e, Event::Reset(0))), 1);
        assert_eq!(device.count(|e| matches!(e, Event::Deallocate(0))), 1);
        assert_eq!(device.availability().allocated, 0);
    }

    #[test]
    fn test_explicit_release() {
        let device = RecordingDevice::new(0, 2);
        let mut q = device.using_qubit().unwrap();
        q.x().unwrap();
        assert_eq!(device.availability(), DeviceAvailability::bounded(1, 1));

        q.release().unwrap();
        assert_eq!(device.availability(), DeviceAvailability::bounded(0, 2));
        assert_eq!(device.count(|e| matches!(e, Event::Reset(_))), 1);
    }

    #[test]
    fn test_explicit_release_surfaces_reset_error() {
        let device = RecordingDevice::new(0, 1).failing_reset();
        let q = device.using_qubit().unwrap();
        assert!(matches!(q.release(), Err(QubitError::Backend(_))));
        assert_eq!(device.availability().allocated, 0);
    }

    #[test]
    fn test_guard_returns_qubit_to_allocating_device() {
        let a = RecordingDevice::new(0, 1);
        let b = RecordingDevice::new(1, 1);
        let q = a.using_qubit().unwrap();
        assert!(std::ptr::eq(q.device(), &a));

        q.release().unwrap();
        assert_eq!(a.availability(), DeviceAvailability::bounded(0, 1));
        assert_eq!(b.availability(), DeviceAvailability::bounded(0, 1));
    }

    #[test]
    fn test_release_surfaces_deallocation_error() {
        let a = RecordingDevice::new(0, 1);
        let b = RecordingDevice::new(1, 1);
        let guard = ScopedQubit::new(&b, a.allocate_qubit().unwrap());

        assert!(matches!(guard.release(), Err(QubitError::InvalidHandle(_))));
        assert_eq!(b.count(|e| matches!(e, Event::Deallocate(_))), 0);
    }

    #[test]
    fn test_double_deallocate_is_invalid_handle() {
        let device = RecordingDevice::new(0, 1);
        let q = device.allocate_qubit().unwrap();
        let stale = q.clone();
        device.deallocate_qubit(q).unwrap();

        let err = device.deallocate_qubit(stale).unwrap_err();
        assert!(matches!(err, QubitError::InvalidHandle(_)));
    }

    #[test]
    fn test_foreign_deallocate_is_invalid_handle() {
        let ours = RecordingDevice::new(0, 1);
        let theirs = RecordingDevice::new(1, 1);
        let q = theirs.allocate_qubit().unwrap();

        assert!(matches!(
            ours.deallocate_qubit(q),
            Err(QubitError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_allocate_deallocate_round_trip() {
        let device = RecordingDevice::new(0, 1);
        for _ in 0..3 {
            let q = device.allocate_qubit().unwrap();
            device.deallocate_qubit(q).unwrap();
        }
        assert_eq!(device.availability(), DeviceAvailability::bounded(0, 1));
    }

    #[test]
    fn test_exhausted_pool_propagates_without_cleanup() {
        let device = RecordingDevice::new(0, 1);
        let _held = device.using_qubit().unwrap();

        let result: Result<bool, ProgramError> = device.with_qubit(|q| Ok(q.measure()?));
        assert!(matches!(
            result,
            Err(ProgramError::Qubit(QubitError::ResourceExhausted(_)))
        ));
        assert_eq!(device.count(|e| matches!(e, Event::Reset(_))), 0);
    }
}
