//! Queue introspection types for the scheduler

use std::time::Duration;

use serde::Serialize;

use super::gate::GateStatus;
use super::job::JobState;
use crate::domain::{ComponentId, DocumentId};

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_cancelled: u64,
    /// Rejected duplicate submissions
    pub total_rejected: u64,
    /// Results that arrived after their job was cancelled
    pub total_discarded: u64,
    /// Debounce timer expiries that started a drain cycle
    pub total_drains: u64,
    pub peak_queue_depth: usize,
    pub peak_running: usize,
}

/// Queue state snapshot
#[derive(Debug, Clone, Serialize)]
pub struct QueueState {
    pub queued: usize,
    pub running: usize,
    pub max_jobs: usize,
    pub gate: GateStatus,
    pub stats: SchedulerStats,
}

impl QueueState {
    /// No job queued or running and no timer armed
    pub fn is_quiescent(&self) -> bool {
        self.queued == 0 && self.running == 0 && self.gate == GateStatus::Idle
    }
}

/// Per-job entry for queue display
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub component_id: ComponentId,
    pub document_id: DocumentId,
    pub state: JobState,
    /// Time spent in the current state
    pub elapsed: Duration,
}
