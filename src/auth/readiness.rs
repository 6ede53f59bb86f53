//! Two-signal barrier in front of the first authentication.
//!
//! Authentication is pointless until the API endpoint is resolved and the
//! client has finished loading. Both happen independently; whichever lands
//! second opens the gate.

use std::sync::atomic::{AtomicU8, Ordering};

/// The API base URL has been resolved (or resolution gave up).
pub const API_ENDPOINT_RESOLVED: u8 = 0b01;
/// The host client finished its own startup.
pub const CLIENT_LOAD_FINISHED: u8 = 0b10;

const ALL: u8 = API_ENDPOINT_RESOLVED | CLIENT_LOAD_FINISHED;

/// What a call to [`ReadinessGate::mark`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Still waiting for the other signal.
    Pending,
    /// This call completed the set. Reported exactly once.
    Opened,
    /// Both signals were already present.
    AlreadyOpen,
}

/// Monotonic two-bit readiness set.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    bits: AtomicU8,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `bit`. Unknown bits are ignored.
    pub fn mark(&self, bit: u8) -> GateState {
        let previous = self.bits.fetch_or(bit & ALL, Ordering::AcqRel);
        if previous == ALL {
            GateState::AlreadyOpen
        } else if previous | (bit & ALL) == ALL {
            GateState::Opened
        } else {
            GateState::Pending
        }
    }

    pub fn is_open(&self) -> bool {
        self.bits.load(Ordering::Acquire) == ALL
    }
}
