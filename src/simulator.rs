//! Reference statevector simulator device.
//!
//! Each pooled qubit is an independent two-amplitude statevector. The pool
//! lives behind an `Arc<Mutex<_>>` shared by the device and every handle
//! it hands out, so one [`SimulatorDevice`] can serve many threads.
//!
//! Device-defined behaviour:
//!
//! | Concern | Behaviour |
//! |---------|-----------|
//! | Empty pool | [`ExhaustionPolicy`] from the config (`Fail` by default) |
//! | Measurement | [`MeasurementPolicy`] from the config (`Collapse` by default) |
//! | Allocation | Idle qubits are reused last-in first-out, reset only if `reset_on_allocate` |
//! | Deallocation | Never resets; scoped acquisition does that |
//! | `ry` period | 4π |

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::capability::{Capabilities, DeviceAvailability, ExhaustionPolicy, MeasurementPolicy};
use crate::config::SimulatorConfig;
use crate::device::QuantumDevice;
use crate::error::{QubitError, QubitResult};
use crate::lifecycle::{QubitId, QubitStatus};
use crate::qubit::Qubit;

/// Distinguishes handles of different devices in the same process.
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(0);

const KET_0: [Complex64; 2] = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
const KET_1: [Complex64; 2] = [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];

/// One simulated qubit resource.
struct Slot {
    index: u32,
    amplitudes: [Complex64; 2],
    status: QubitStatus,
}

impl Slot {
    fn new(index: u32) -> Self {
        Self {
            index,
            amplitudes: KET_0,
            status: QubitStatus::Unallocated,
        }
    }

    fn transition(&mut self, next: QubitStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal qubit transition {} -> {}",
            self.status,
            next
        );
        self.status = next;
    }

    fn probability_one(&self) -> f64 {
        self.amplitudes[1].norm_sqr()
    }

    fn h(&mut self) {
        let [a, b] = self.amplitudes;
        self.amplitudes = [(a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2];
        self.transition(QubitStatus::InUse);
    }

    fn x(&mut self) {
        self.amplitudes.swap(0, 1);
        self.transition(QubitStatus::InUse);
    }

    fn ry(&mut self, angle: f64) {
        let half = angle.rem_euclid(4.0 * PI) / 2.0;
        let (sin, cos) = half.sin_cos();
        let [a, b] = self.amplitudes;
        self.amplitudes = [a * cos - b * sin, a * sin + b * cos];
        self.transition(QubitStatus::InUse);
    }

    fn measure(&mut self, rng: &mut StdRng, policy: MeasurementPolicy) -> bool {
        let outcome = rng.r#gen::<f64>() < self.probability_one();
        if policy == MeasurementPolicy::Collapse {
            self.amplitudes = if outcome { KET_1 } else { KET_0 };
        }
        self.transition(QubitStatus::InUse);
        outcome
    }

    fn reset(&mut self) {
        self.amplitudes = KET_0;
        self.transition(QubitStatus::Clean);
    }
}

/// Pool state shared between a device and its handles.
struct Register {
    active: FxHashMap<QubitId, Slot>,
    idle: Vec<Slot>,
    created: u32,
    next_id: u64,
    rng: StdRng,
}

impl Register {
    fn new(num_qubits: u32, seed: Option<u64>) -> Self {
        Self {
            active: FxHashMap::default(),
            idle: (0..num_qubits).rev().map(Slot::new).collect(),
            created: num_qubits,
            next_id: 0,
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }
}

fn lock(register: &Mutex<Register>) -> MutexGuard<'_, Register> {
    register.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Local statevector simulator.
///
/// Supports every [`Qubit`] operation. Construct it from a
/// [`SimulatorConfig`] to choose pool size, exhaustion and measurement
/// policy, and a sampling seed.
pub struct SimulatorDevice {
    id: u64,
    config: SimulatorConfig,
    capabilities: Capabilities,
    register: Arc<Mutex<Register>>,
}

impl SimulatorDevice {
    /// Create a simulator with `num_qubits` pooled qubits and default policies.
    ///
    /// The pool holds at least one qubit; `new(0)` behaves like `new(1)`.
    pub fn new(num_qubits: u32) -> Self {
        Self::build(SimulatorConfig::new(num_qubits.max(1)))
    }

    /// Create a simulator from a validated configuration.
    pub fn from_config(config: SimulatorConfig) -> QubitResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulatorConfig) -> Self {
        let capabilities = Capabilities::simulator(config.num_qubits)
            .with_name(config.name.clone())
            .with_exhaustion(config.exhaustion)
            .with_measurement(config.measurement);
        let register = Register::new(config.num_qubits, config.seed);

        Self {
            id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            capabilities,
            register: Arc::new(Mutex::new(register)),
        }
    }

    /// The configuration this device was built from.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Lifecycle status of a qubit handle; `Unallocated` once released.
    pub fn status(&self, id: QubitId) -> QubitStatus {
        lock(&self.register)
            .active
            .get(&id)
            .map_or(QubitStatus::Unallocated, |slot| slot.status)
    }
}

impl Default for SimulatorDevice {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for SimulatorDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatorDevice")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QuantumDevice for SimulatorDevice {
    type Qubit = SimulatedQubit;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn availability(&self) -> DeviceAvailability {
        let register = lock(&self.register);
        let allocated = register.active.len() as u32;
        match self.config.exhaustion {
            ExhaustionPolicy::Fail => DeviceAvailability::bounded(allocated, register.idle.len() as u32),
            ExhaustionPolicy::Grow => DeviceAvailability::unbounded(allocated),
        }
    }

    fn allocate_qubit(&self) -> QubitResult<SimulatedQubit> {
        let mut register = lock(&self.register);

        let mut slot = match register.idle.pop() {
            Some(slot) => slot,
            None if self.config.exhaustion == ExhaustionPolicy::Grow => {
                let slot = Slot::new(register.created);
                register.created += 1;
                slot
            }
            None => {
                return Err(QubitError::ResourceExhausted(format!(
                    "all {} qubits of {} are allocated",
                    register.created, self.config.name
                )));
            }
        };

        if self.config.reset_on_allocate {
            slot.amplitudes = KET_0;
        }
        slot.transition(QubitStatus::InUse);

        let id = QubitId::new(register.next_id);
        register.next_id += 1;
        debug!("Allocated {} (slot {}) on {}", id, slot.index, self.config.name);
        register.active.insert(id, slot);

        Ok(SimulatedQubit {
            device: self.id,
            id,
            measurement: self.config.measurement,
            register: Arc::clone(&self.register),
        })
    }

    fn deallocate_qubit(&self, qubit: SimulatedQubit) -> QubitResult<()> {
        if qubit.device != self.id {
            return Err(QubitError::InvalidHandle(format!(
                "{} was not allocated by {}",
                qubit.id, self.config.name
            )));
        }

        let mut register = lock(&self.register);
        let mut slot = register.active.remove(&qubit.id).ok_or_else(|| {
            QubitError::InvalidHandle(format!("{} is not allocated on {}", qubit.id, self.config.name))
        })?;
        slot.transition(QubitStatus::Unallocated);
        debug!("Deallocated {} (slot {}) on {}", qubit.id, slot.index, self.config.name);
        register.idle.push(slot);
        Ok(())
    }
}

/// Handle to a qubit of a [`SimulatorDevice`].
///
/// Handles are cheap to clone; a clone kept past deallocation is stale and
/// every operation on it fails with [`QubitError::InvalidState`].
#[derive(Clone)]
pub struct SimulatedQubit {
    device: u64,
    id: QubitId,
    measurement: MeasurementPolicy,
    register: Arc<Mutex<Register>>,
}

impl SimulatedQubit {
    /// Identifier of this allocation.
    pub fn id(&self) -> QubitId {
        self.id
    }

    /// Probability of measuring `true`, read without disturbing the state.
    pub fn probability_one(&self) -> QubitResult<f64> {
        self.with_slot(|slot, _| slot.probability_one())
    }

    fn with_slot<R>(&self, op: impl FnOnce(&mut Slot, &mut StdRng) -> R) -> QubitResult<R> {
        let mut register = lock(&self.register);
        let Register { active, rng, .. } = &mut *register;
        let slot = active.get_mut(&self.id).ok_or_else(|| {
            QubitError::InvalidState(format!("{} has been deallocated", self.id))
        })?;
        Ok(op(slot, rng))
    }
}

impl fmt::Debug for SimulatedQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedQubit")
            .field("device", &self.device)
            .field("id", &self.id)
            .field("measurement", &self.measurement)
            .finish_non_exhaustive()
    }
}

impl Qubit for SimulatedQubit {
    fn h(&mut self) -> QubitResult<()> {
        self.with_slot(|slot, _| slot.h())
    }

    fn x(&mut self) -> QubitResult<()> {
        self.with_slot(|slot, _| slot.x())
    }

    fn ry(&mut self, angle: f64) -> QubitResult<()> {
        if !angle.is_finite() {
            return Err(QubitError::InvalidArgument(format!(
                "rotation angle must be finite, got {angle}"
            )));
        }
        self.with_slot(|slot, _| slot.ry(angle))
    }

    fn measure(&mut self) -> QubitResult<bool> {
        let policy = self.measurement;
        self.with_slot(|slot, rng| slot.measure(rng, policy))
    }

    fn reset(&mut self) -> QubitResult<()> {
        self.with_slot(|slot, _| slot.reset())
    }
}
