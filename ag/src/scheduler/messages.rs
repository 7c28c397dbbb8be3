//! Scheduler messages
//!
//! Commands and responses for the scheduler actor.

use thiserror::Error;
use tokio::sync::oneshot;

use super::job::{JobHandle, RenderJob};
use super::queue::{QueueEntry, QueueState};
use crate::domain::{ComponentId, DocumentId, RenderArtifact};
use crate::renderer::RenderError;

/// Errors from scheduler operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Component {0} already has a queued or running job")]
    DuplicateSubmission(ComponentId),

    #[error("Scheduler channel closed")]
    ChannelClosed,
}

impl From<oneshot::error::RecvError> for SchedulerError {
    fn from(_: oneshot::error::RecvError) -> Self {
        SchedulerError::ChannelClosed
    }
}

/// Response from scheduler operations
pub type SchedulerResponse<T> = Result<T, SchedulerError>;

/// Commands sent to the scheduler actor
#[derive(Debug)]
pub enum SchedulerCommand {
    Submit {
        job: RenderJob,
        reply: oneshot::Sender<SchedulerResponse<JobHandle>>,
    },
    /// Cancel any tracked job for the component, then submit
    Resubmit {
        job: RenderJob,
        reply: oneshot::Sender<SchedulerResponse<JobHandle>>,
    },
    Cancel {
        component_id: ComponentId,
        reply: oneshot::Sender<bool>,
    },
    CloseDocument {
        document_id: DocumentId,
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueState>,
    },
    QueueDetails {
        reply: oneshot::Sender<Vec<QueueEntry>>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}

/// Reported by a render task when it ends, however it ends
#[derive(Debug)]
pub(crate) struct RenderFinished {
    pub component_id: ComponentId,
    pub token: u64,
    pub result: Result<RenderArtifact, RenderError>,
}
