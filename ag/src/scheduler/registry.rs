//! Job registry - the single source of truth for job state
//!
//! Every tracked job lives in one map keyed by component id, tagged with
//! its state. Submit, promote, complete and cancel all go through here.
//! Terminal jobs are removed as they resolve; nothing is kept afterwards.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use super::job::{JobOutcome, JobState, RenderJob};
use super::messages::SchedulerError;
use super::queue::QueueEntry;
use crate::domain::{ComponentId, DocumentId, RenderArtifact};
use crate::renderer::RenderError;

#[derive(Debug)]
struct JobRecord {
    job: RenderJob,
    state: JobState,
    /// Submission sequence number; also tells a stale completion apart
    /// from one for a later resubmission of the same component
    token: u64,
    submitted_at: Instant,
    started_at: Option<Instant>,
    reply: oneshot::Sender<JobOutcome>,
}

impl JobRecord {
    fn resolve(self, outcome: JobOutcome) {
        // The submitter may have dropped its handle
        let _ = self.reply.send(outcome);
    }
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<ComponentId, JobRecord>,
    next_token: u64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new Queued job; fails if the component already has one
    pub fn insert(&mut self, job: RenderJob, reply: oneshot::Sender<JobOutcome>) -> Result<u64, SchedulerError> {
        let component_id = job.component_id().clone();
        debug!(%component_id, "JobRegistry::insert: called");
        if self.jobs.contains_key(&component_id) {
            return Err(SchedulerError::DuplicateSubmission(component_id));
        }

        self.next_token += 1;
        let token = self.next_token;
        self.jobs.insert(
            component_id,
            JobRecord {
                job,
                state: JobState::Queued,
                token,
                submitted_at: Instant::now(),
                started_at: None,
                reply,
            },
        );
        Ok(token)
    }

    pub fn contains(&self, component_id: &ComponentId) -> bool {
        self.jobs.contains_key(component_id)
    }

    pub fn state(&self, component_id: &ComponentId) -> Option<JobState> {
        self.jobs.get(component_id).map(|record| record.state)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn queued_count(&self) -> usize {
        self.count_in(JobState::Queued)
    }

    pub fn running_count(&self) -> usize {
        self.count_in(JobState::Running)
    }

    fn count_in(&self, state: JobState) -> usize {
        self.jobs.values().filter(|record| record.state == state).count()
    }

    /// Earliest submitted job still Queued
    pub fn next_queued(&self) -> Option<&ComponentId> {
        self.jobs
            .iter()
            .filter(|(_, record)| record.state == JobState::Queued)
            .min_by_key(|(_, record)| record.token)
            .map(|(id, _)| id)
    }

    /// Queued -> Running; returns the job and its token
    pub fn promote(&mut self, component_id: &ComponentId) -> Option<(RenderJob, u64)> {
        debug!(%component_id, "JobRegistry::promote: called");
        let record = self.jobs.get_mut(component_id)?;
        if !record.state.can_transition_to(JobState::Running) {
            debug!(%component_id, state = %record.state, "JobRegistry::promote: not queued");
            return None;
        }
        record.state = JobState::Running;
        record.started_at = Some(Instant::now());
        Some((record.job.clone(), record.token))
    }

    /// Promote the earliest Queued job
    pub fn promote_next(&mut self) -> Option<(RenderJob, u64)> {
        let component_id = self.next_queued()?.clone();
        self.promote(&component_id)
    }

    /// Running -> Completed/Failed; removes the record and resolves its handle
    ///
    /// Returns `None` and leaves the registry untouched when the result
    /// belongs to a job that is no longer tracked under this token.
    pub fn complete(
        &mut self,
        component_id: &ComponentId,
        token: u64,
        result: Result<RenderArtifact, RenderError>,
    ) -> Option<JobState> {
        debug!(%component_id, token, "JobRegistry::complete: called");
        match self.jobs.get(component_id) {
            Some(record) if record.token == token && record.state == JobState::Running => {}
            _ => {
                debug!(%component_id, token, "JobRegistry::complete: no matching running job");
                return None;
            }
        }

        let record = self.jobs.remove(component_id)?;
        let outcome = JobOutcome::from_result(result);
        let state = outcome.state();
        record.resolve(outcome);
        Some(state)
    }

    /// Queued/Running -> Cancelled; returns the state the job was in
    pub fn cancel(&mut self, component_id: &ComponentId) -> Option<JobState> {
        debug!(%component_id, "JobRegistry::cancel: called");
        let record = self.jobs.remove(component_id)?;
        let previous = record.state;
        record.resolve(JobOutcome::Cancelled);
        Some(previous)
    }

    /// Cancel every job of a document; returns the cancelled ids
    pub fn cancel_document(&mut self, document_id: &DocumentId) -> Vec<ComponentId> {
        debug!(%document_id, "JobRegistry::cancel_document: called");
        let ids: Vec<ComponentId> = self
            .jobs
            .iter()
            .filter(|(_, record)| &record.job.document_id == document_id)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            self.cancel(id);
        }
        ids
    }

    /// Cancel everything; returns how many jobs were discarded
    pub fn cancel_all(&mut self) -> usize {
        debug!(count = self.jobs.len(), "JobRegistry::cancel_all: called");
        let count = self.jobs.len();
        for (_, record) in self.jobs.drain() {
            record.resolve(JobOutcome::Cancelled);
        }
        count
    }

    /// Entries for display: Running first, then in submission order
    pub fn entries(&self) -> Vec<QueueEntry> {
        let now = Instant::now();
        let mut records: Vec<&JobRecord> = self.jobs.values().collect();
        records.sort_by_key(|record| (record.state != JobState::Running, record.token));

        records
            .into_iter()
            .map(|record| QueueEntry {
                component_id: record.job.component_id().clone(),
                document_id: record.job.document_id.clone(),
                state: record.state,
                elapsed: now - record.started_at.unwrap_or(record.submitted_at),
            })
            .collect()
    }
}
