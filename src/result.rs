//! Measurement tallies and repeated sampling.
//!
//! [`sample`] is the canonical client of scoped acquisition: every shot
//! borrows a fresh qubit, prepares it, measures it, and hands it back
//! reset, so shots never observe each other's state.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::device::QuantumDevice;
use crate::error::{QubitError, QubitResult};
use crate::qubit::Qubit;

/// Measurement counts for single-qubit outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Number of `false` outcomes.
    zeros: u64,
    /// Number of `true` outcomes.
    ones: u64,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome.
    pub fn insert(&mut self, outcome: bool) {
        if outcome {
            self.ones += 1;
        } else {
            self.zeros += 1;
        }
    }

    /// Get the count for an outcome.
    pub fn get(&self, outcome: bool) -> u64 {
        if outcome { self.ones } else { self.zeros }
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.zeros + self.ones
    }

    /// Observed frequency of `outcome`, `None` when empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn probability(&self, outcome: bool) -> Option<f64> {
        let total = self.total_shots();
        if total == 0 {
            return None;
        }
        Some(self.get(outcome) as f64 / total as f64)
    }

    /// Get the most frequent outcome; ties and empty counts yield `None`.
    pub fn most_frequent(&self) -> Option<bool> {
        match self.ones.cmp(&self.zeros) {
            std::cmp::Ordering::Greater => Some(true),
            std::cmp::Ordering::Less => Some(false),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.total_shots() == 0
    }
}

impl FromIterator<bool> for Counts {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut counts = Self::new();
        for outcome in iter {
            counts.insert(outcome);
        }
        counts
    }
}

impl Extend<bool> for Counts {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for outcome in iter {
            self.insert(outcome);
        }
    }
}

/// Prepare and measure a scoped qubit `shots` times.
///
/// Each shot allocates through [`QuantumDevice::with_qubit`], so the qubit
/// is reset and released even when `prepare` fails. The first failing
/// shot aborts sampling and its error is returned.
#[instrument(skip(device, prepare), fields(device = device.name()))]
pub fn sample<D, F>(device: &D, shots: u32, mut prepare: F) -> QubitResult<Counts>
where
    D: QuantumDevice,
    F: FnMut(&mut D::Qubit) -> QubitResult<()>,
{
    if shots == 0 {
        return Err(QubitError::InvalidArgument("shots must be at least 1".into()));
    }

    let start = Instant::now();
    let mut counts = Counts::new();

    for shot in 0..shots {
        let outcome = device.with_qubit(|qubit| {
            prepare(qubit)?;
            qubit.measure()
        })?;
        counts.insert(outcome);

        if shot > 0 && shot % 1000 == 0 {
            debug!("Completed {} shots", shot);
        }
    }

    debug!("Sampling completed in {:?}", start.elapsed());
    Ok(counts)
}
