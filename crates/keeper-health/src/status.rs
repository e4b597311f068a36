//! Status state machine.
//!
//! ```text
//!   Unknown ──ok──▶ Up ◀──ok── Down
//!      │            │  ──fail──▶ ▲
//!      └────fail────┴────────────┘
//!
//!   any ──halt──▶ Halt   (absorbing)
//! ```
//!
//! A single probe result flips the status; there is no debounce. `Halt`
//! is only entered on deregistration intent, never from a probe.

use tracing::{debug, warn};

use keeper_state::Status;

use crate::prober::ProbeResult;

/// Next status for `current` given one probe outcome.
pub fn transition(current: Status, result: ProbeResult) -> Status {
    match (current, result) {
        (Status::Halt, _) => Status::Halt,
        (_, ProbeResult::Healthy) => Status::Up,
        (_, ProbeResult::Unhealthy | ProbeResult::Failed) => Status::Down,
    }
}

/// Tracks the status of one registration across probe outcomes.
#[derive(Debug, Default)]
pub struct StatusMachine {
    status: Status,
    /// Consecutive non-healthy outcomes, for diagnostics only.
    consecutive_failures: u32,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a probe result and return the new status.
    pub fn record(&mut self, result: ProbeResult) -> Status {
        let next = transition(self.status, result);
        if next == Status::Halt {
            return next;
        }

        if result.is_healthy() {
            if self.status != Status::Up {
                debug!(previous = %self.status, "instance is up");
            }
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            if self.status != Status::Down {
                warn!(previous = %self.status, ?result, "instance is down");
            }
        }

        self.status = next;
        next
    }

    /// Stop accepting probe outcomes.
    pub fn halt(&mut self) {
        self.status = Status::Halt;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halt
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
