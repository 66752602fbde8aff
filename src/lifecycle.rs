//! Qubit handle lifecycle types.
//!
//! The state machine of a single qubit handle:
//!
//! ```text
//!                 allocate_qubit()            reset()
//!   Unallocated ─────────────────→ InUse ─────────────→ Clean
//!        ↑                          │  ↑   h/x/ry/measure  │
//!        │                          │  └───────────────────┤
//!        │      deallocate_qubit()  │                      │
//!        └──────────────────────────┴──────────────────────┘
//! ```
//!
//! **Invariants:**
//! - Scoped acquisition always passes through `Clean` before `Unallocated`.
//! - Manual allocate/deallocate pairs may go `InUse → Unallocated` directly.
//! - A handle never returns to `InUse` once it reached `Unallocated`; the
//!   next allocation of the same resource gets a fresh [`QubitId`].

use serde::{Deserialize, Serialize};

/// Unique identifier for an allocated qubit handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QubitId(pub u64);

impl QubitId {
    /// Create a new qubit ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for QubitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u64> for QubitId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a qubit resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QubitStatus {
    /// Resource is idle in the device pool.
    Unallocated,
    /// Allocated, state possibly altered by operations.
    InUse,
    /// Allocated and reset to logical zero.
    Clean,
}

impl QubitStatus {
    /// Check if the resource is held by a caller.
    pub fn is_allocated(&self) -> bool {
        matches!(self, QubitStatus::InUse | QubitStatus::Clean)
    }

    /// Check if the resource is known to be in logical zero.
    pub fn is_clean(&self) -> bool {
        matches!(self, QubitStatus::Clean)
    }

    /// Check whether `next` is a legal successor state.
    pub fn can_transition_to(&self, next: QubitStatus) -> bool {
        use QubitStatus::{Clean, InUse, Unallocated};
        matches!(
            (self, next),
            (Unallocated, InUse)
                | (InUse, InUse)
                | (InUse, Clean)
                | (Clean, Clean)
                | (Clean, InUse)
                | (InUse, Unallocated)
                | (Clean, Unallocated)
        )
    }
}

impl std::fmt::Display for QubitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QubitStatus::Unallocated => write!(f, "Unallocated"),
            QubitStatus::InUse => write!(f, "InUse"),
            QubitStatus::Clean => write!(f, "Clean"),
        }
    }
}
