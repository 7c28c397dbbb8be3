//! Render job scheduler
//!
//! Tracks each component's render request through
//! Queued -> Running -> Completed/Failed/Cancelled, holds work back until a
//! debounce quiet period has passed, and keeps the number of running
//! renders under a fixed cap.

mod config;
mod core;
mod dispatch;
mod gate;
mod handle;
mod job;
mod messages;
mod queue;
mod registry;

pub use config::SchedulerConfig;
pub use core::JobScheduler;
pub use dispatch::render_job;
pub use gate::{DebounceGate, GateState, GateStatus};
pub use handle::{RenderJobManager, WeakRenderJobManager};
pub use job::{JobHandle, JobOutcome, JobState, RenderJob};
pub use messages::{SchedulerCommand, SchedulerError, SchedulerResponse};
pub use queue::{QueueEntry, QueueState, SchedulerStats};
pub use registry::JobRegistry;
