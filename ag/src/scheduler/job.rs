//! Render jobs, their lifecycle states and completion handles

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::domain::{Component, ComponentId, DocumentId, LayerId, RenderArtifact};
use crate::renderer::RenderError;

/// One request to render a component of a layer in a document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub document_id: DocumentId,
    pub layer_id: LayerId,
    pub component: Component,
}

impl RenderJob {
    pub fn new(document_id: impl Into<DocumentId>, layer_id: impl Into<LayerId>, component: Component) -> Self {
        Self {
            document_id: document_id.into(),
            layer_id: layer_id.into(),
            component,
        }
    }

    /// The registry key for this job
    pub fn component_id(&self) -> &ComponentId {
        &self.component.id
    }
}

/// Lifecycle state of a job
///
/// `Queued -> Running -> {Completed | Failed | Cancelled}` and
/// `Queued -> Cancelled`. Terminal states have no way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check whether the state machine allows `self -> next`
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Queued, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result delivered through a [`JobHandle`]
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(RenderArtifact),
    Failed(RenderError),
    Cancelled,
}

impl JobOutcome {
    pub fn from_result(result: Result<RenderArtifact, RenderError>) -> Self {
        match result {
            Ok(artifact) => Self::Completed(artifact),
            Err(e) => Self::Failed(e),
        }
    }

    /// The terminal state this outcome corresponds to
    pub fn state(&self) -> JobState {
        match self {
            Self::Completed(_) => JobState::Completed,
            Self::Failed(_) => JobState::Failed,
            Self::Cancelled => JobState::Cancelled,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Awaitable completion handle returned by `submit`
///
/// Resolves exactly once. If the scheduler goes away before resolving the
/// job, the handle reports [`JobOutcome::Cancelled`].
#[derive(Debug)]
pub struct JobHandle {
    component_id: ComponentId,
    rx: oneshot::Receiver<JobOutcome>,
    /// Outcome already received through `try_outcome`
    resolved: Option<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(component_id: ComponentId, rx: oneshot::Receiver<JobOutcome>) -> Self {
        Self {
            component_id,
            rx,
            resolved: None,
        }
    }

    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// Wait for the job to reach a terminal state
    pub async fn outcome(self) -> JobOutcome {
        if let Some(outcome) = self.resolved {
            return outcome;
        }
        self.rx.await.unwrap_or(JobOutcome::Cancelled)
    }

    /// Poll without waiting; `None` while the job is still pending or once
    /// the outcome has already been taken
    pub fn try_outcome(&mut self) -> Option<JobOutcome> {
        if self.resolved.is_some() {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => JobOutcome::Cancelled,
        };
        self.resolved = Some(outcome.clone());
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobState; 5] = [
        JobState::Queued,
        JobState::Running,
        JobState::Completed,
        JobState::Failed,
        JobState::Cancelled,
    ];

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {} must be rejected", from, to);
            }
        }
    }

    #[test]
    fn test_valid_transitions() {
        assert!(JobState::Queued.can_transition_to(JobState::Running));
        assert!(JobState::Queued.can_transition_to(JobState::Cancelled));
        assert!(!JobState::Queued.can_transition_to(JobState::Completed));
        assert!(!JobState::Queued.can_transition_to(JobState::Failed));
        assert!(JobState::Running.can_transition_to(JobState::Completed));
        assert!(JobState::Running.can_transition_to(JobState::Failed));
        assert!(JobState::Running.can_transition_to(JobState::Cancelled));
        assert!(!JobState::Running.can_transition_to(JobState::Queued));
    }

    #[test]
    fn test_outcome_state() {
        let artifact = RenderArtifact {
            component_id: ComponentId::new("c"),
            width: 1,
            height: 1,
            data: vec![0; 4],
        };
        assert_eq!(JobOutcome::from_result(Ok(artifact)).state(), JobState::Completed);
        assert_eq!(
            JobOutcome::from_result(Err(RenderError::Aborted)).state(),
            JobState::Failed
        );
        assert_eq!(JobOutcome::Cancelled.state(), JobState::Cancelled);
    }

    #[tokio::test]
    async fn test_handle_resolves_once() {
        let (tx, rx) = oneshot::channel();
        let mut handle = JobHandle::new(ComponentId::new("c"), rx);
        assert!(handle.try_outcome().is_none());

        tx.send(JobOutcome::Cancelled).unwrap();
        assert_eq!(handle.try_outcome(), Some(JobOutcome::Cancelled));
        assert!(handle.try_outcome().is_none());
    }

    #[tokio::test]
    async fn test_outcome_after_try_outcome_keeps_result() {
        let (tx, rx) = oneshot::channel();
        let mut handle = JobHandle::new(ComponentId::new("c"), rx);
        let failed = JobOutcome::Failed(RenderError::Render("bad pixels".to_string()));

        tx.send(failed.clone()).unwrap();
        assert_eq!(handle.try_outcome(), Some(failed.clone()));
        assert_eq!(handle.outcome().await, failed);
    }

    #[tokio::test]
    async fn test_dropped_sender_reads_as_cancelled() {
        let (tx, rx) = oneshot::channel::<JobOutcome>();
        let handle = JobHandle::new(ComponentId::new("c"), rx);
        drop(tx);
        assert!(handle.outcome().await.is_cancelled());
    }
}
