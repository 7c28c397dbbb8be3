//! Debounce gate
//!
//! Holds at most one pending timer. The first submission after an idle
//! period arms it and submissions while it is armed are coalesced into
//! that cycle. A drain in progress can be re-armed when work arrives that
//! no completion would pick up.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Internal gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No timer, no drain cycle in progress
    Idle,
    /// Timer pending; the drain starts at `deadline`
    Armed { deadline: Instant },
    /// Timer fired; completions keep draining until the registry empties
    Draining,
}

/// Gate state for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Idle,
    Armed,
    Draining,
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Armed => write!(f, "armed"),
            Self::Draining => write!(f, "draining"),
        }
    }
}

#[derive(Debug)]
pub struct DebounceGate {
    quiet_period: Duration,
    state: GateState,
}

impl DebounceGate {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            state: GateState::Idle,
        }
    }

    /// Arm the timer if idle; returns true when a fresh timer was armed
    pub fn arm(&mut self) -> bool {
        match self.state {
            GateState::Idle => {
                let deadline = Instant::now() + self.quiet_period;
                debug!(quiet_period = ?self.quiet_period, "DebounceGate::arm: armed");
                self.state = GateState::Armed { deadline };
                true
            }
            GateState::Armed { .. } | GateState::Draining => {
                debug!(state = ?self.state, "DebounceGate::arm: already active, coalescing");
                false
            }
        }
    }

    /// Start a fresh quiet period from a drain cycle; returns false unless
    /// the gate was draining
    pub fn rearm(&mut self) -> bool {
        match self.state {
            GateState::Draining => {
                let deadline = Instant::now() + self.quiet_period;
                debug!(quiet_period = ?self.quiet_period, "DebounceGate::rearm: re-armed from drain");
                self.state = GateState::Armed { deadline };
                true
            }
            _ => false,
        }
    }

    /// When the pending timer expires, if one is armed
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GateState::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Consume the expired timer; returns true if a drain should start
    pub fn fire(&mut self) -> bool {
        match self.state {
            GateState::Armed { .. } => {
                self.state = GateState::Draining;
                true
            }
            _ => false,
        }
    }

    /// Back to idle: the registry is quiescent
    pub fn settle(&mut self) {
        self.state = GateState::Idle;
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn status(&self) -> GateStatus {
        match self.state {
            GateState::Idle => GateStatus::Idle,
            GateState::Armed { .. } => GateStatus::Armed,
            GateState::Draining => GateStatus::Draining,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, GateState::Armed { .. })
    }

    pub fn is_draining(&self) -> bool {
        matches!(self.state, GateState::Draining)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GateState::Idle)
    }
}
