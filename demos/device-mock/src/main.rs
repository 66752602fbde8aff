//! Minimal mock device implementing the qubit contract.
//!
//! This example demonstrates how to implement `QuantumDevice` and `Qubit`
//! for a classical stand-in device, and how scoped acquisition keeps the
//! pool intact when a program fails half-way. It then samples a few
//! states on the bundled statevector simulator.

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

use qubit_contract::{
    Capabilities, DeviceAvailability, QuantumDevice, Qubit, QubitError, QubitResult,
    SimulatorConfig, SimulatorDevice, sample,
};
use tracing::info;

/// A classical bit pretending to be a qubit. Only `x` is a real gate.
struct BitQubit {
    slot: usize,
    bits: Arc<Mutex<Vec<Option<bool>>>>,
}

impl BitQubit {
    fn update(&self, op: impl FnOnce(&mut bool)) -> QubitResult<()> {
        let mut bits = self.bits.lock().unwrap();
        let bit = bits[self.slot]
            .as_mut()
            .ok_or_else(|| QubitError::InvalidState(format!("bit {} is released", self.slot)))?;
        op(bit);
        Ok(())
    }
}

impl Qubit for BitQubit {
    fn h(&mut self) -> QubitResult<()> {
        Err(QubitError::Unsupported("h on a classical bit".into()))
    }

    fn x(&mut self) -> QubitResult<()> {
        self.update(|bit| *bit = !*bit)
    }

    fn ry(&mut self, _angle: f64) -> QubitResult<()> {
        Err(QubitError::Unsupported("ry on a classical bit".into()))
    }

    fn measure(&mut self) -> QubitResult<bool> {
        let mut outcome = false;
        self.update(|bit| outcome = *bit)?;
        Ok(outcome)
    }

    fn reset(&mut self) -> QubitResult<()> {
        self.update(|bit| *bit = false)
    }
}

/// Fixed pool of classical bits; `None` marks a free slot.
struct BitDevice {
    capabilities: Capabilities,
    bits: Arc<Mutex<Vec<Option<bool>>>>,
}

impl BitDevice {
    fn new(size: usize) -> Self {
        Self {
            capabilities: Capabilities::simulator(size as u32)
                .with_name("classical-bits")
                .with_operations(["x", "measure", "reset"]),
            bits: Arc::new(Mutex::new(vec![None; size])),
        }
    }
}

impl QuantumDevice for BitDevice {
    type Qubit = BitQubit;

    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn availability(&self) -> DeviceAvailability {
        let bits = self.bits.lock().unwrap();
        let allocated = bits.iter().filter(|b| b.is_some()).count() as u32;
        DeviceAvailability::bounded(allocated, bits.len() as u32 - allocated)
    }

    fn allocate_qubit(&self) -> QubitResult<BitQubit> {
        let mut bits = self.bits.lock().unwrap();
        let slot = bits
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| QubitError::ResourceExhausted("all bits in use".into()))?;
        bits[slot] = Some(false);
        Ok(BitQubit {
            slot,
            bits: Arc::clone(&self.bits),
        })
    }

    fn deallocate_qubit(&self, qubit: BitQubit) -> QubitResult<()> {
        if !Arc::ptr_eq(&self.bits, &qubit.bits) {
            return Err(QubitError::InvalidHandle("bit from another device".into()));
        }
        let mut bits = self.bits.lock().unwrap();
        bits[qubit.slot]
            .take()
            .map(|_| ())
            .ok_or_else(|| QubitError::InvalidHandle(format!("bit {} already released", qubit.slot)))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let device = BitDevice::new(2);
    info!("Device: {}", device.name());
    info!("Operations: {:?}", device.capabilities().operations);

    // A program that works on this device.
    let flipped = device.with_qubit(|q| {
        q.x()?;
        q.measure()
    })?;
    info!("x then measure: {}", flipped);

    // A program that does not: the bit is still reset and released.
    let failed = device.with_qubit(|q| {
        q.x()?;
        q.h()?;
        q.measure()
    });
    info!("x then h: {:?}", failed.err());
    info!("Availability after failure: {:?}", device.availability());

    // The same programs on the simulator.
    let simulator = SimulatorDevice::from_config(SimulatorConfig::new(1).with_seed(7))?;
    info!("Device: {} ({:?})", simulator.name(), simulator.capabilities().measurement);

    let coin = sample(&simulator, 1000, |q| q.h())?;
    info!(
        "h: {} zeros, {} ones",
        coin.get(false),
        coin.get(true)
    );

    let biased = sample(&simulator, 1000, |q| q.ry(PI / 3.0))?;
    if let Some(p) = biased.probability(true) {
        info!("ry(pi/3): p(1) = {:.3} (expected 0.250)", p);
    }

    Ok(())
}
