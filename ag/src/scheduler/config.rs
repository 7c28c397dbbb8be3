//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Max concurrently running render jobs (host parallelism when unset)
    #[serde(rename = "max-jobs", default)]
    pub max_jobs: Option<usize>,

    /// Quiet period between arming the gate and the first drain
    #[serde(rename = "quiet-period-ms", default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// Channel buffer size for scheduler commands
    #[serde(rename = "channel-buffer", default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_quiet_period_ms() -> u64 {
    1000
}

fn default_channel_buffer() -> usize {
    256
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_jobs: None,
            quiet_period_ms: 1000,
            channel_buffer: 256,
        }
    }
}

impl SchedulerConfig {
    /// Concurrency cap actually enforced, never below one
    pub fn effective_max_jobs(&self) -> usize {
        self.max_jobs
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1)
    }

    /// Get the quiet period as a Duration
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}
