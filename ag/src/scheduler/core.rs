//! Scheduler actor
//!
//! One task owns the job registry, the debounce gate and the render task
//! set. Commands from handles, timer expiry and render completions are
//! all applied here, one at a time.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use super::dispatch::run_render;
use super::gate::{DebounceGate, GateState};
use super::job::{JobHandle, JobState, RenderJob};
use super::messages::{RenderFinished, SchedulerCommand, SchedulerResponse};
use super::queue::{QueueState, SchedulerStats};
use super::registry::JobRegistry;
use crate::domain::{ComponentId, DocumentId};
use crate::renderer::{BoundsProvider, RendererRegistry};

/// The JobScheduler runs render jobs under a concurrency cap, starting
/// work only after the debounce quiet period
pub struct JobScheduler {
    max_jobs: usize,
    registry: JobRegistry,
    gate: DebounceGate,
    renderers: Arc<RendererRegistry>,
    bounds: Arc<dyn BoundsProvider>,
    rx: mpsc::Receiver<SchedulerCommand>,
    finished_tx: mpsc::UnboundedSender<RenderFinished>,
    finished_rx: mpsc::UnboundedReceiver<RenderFinished>,
    tasks: JoinSet<()>,
    stats: SchedulerStats,
}

async fn gate_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl JobScheduler {
    /// Create a scheduler and the sender used to command it
    pub fn new(
        config: &SchedulerConfig,
        renderers: Arc<RendererRegistry>,
        bounds: Arc<dyn BoundsProvider>,
    ) -> (Self, mpsc::Sender<SchedulerCommand>) {
        debug!(?config, "JobScheduler::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer.max(1));
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            max_jobs: config.effective_max_jobs(),
            registry: JobRegistry::new(),
            gate: DebounceGate::new(config.quiet_period()),
            renderers,
            bounds,
            rx,
            finished_tx,
            finished_rx,
            tasks: JoinSet::new(),
            stats: SchedulerStats::default(),
        };
        (scheduler, tx)
    }

    /// Run until shut down or every sender is dropped
    pub async fn run(mut self) {
        info!(max_jobs = self.max_jobs, "JobScheduler started");

        loop {
            let deadline = self.gate.deadline();
            tokio::select! {
                biased;

                Some(finished) = self.finished_rx.recv() => {
                    self.on_render_finished(finished);
                }

                _ = gate_expiry(deadline) => {
                    self.on_gate_expired();
                }

                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("JobScheduler::run: all handles dropped");
                        self.shutdown().await;
                        break;
                    };
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "Render task panicked");
                        }
                    }
                }
            }
        }

        info!("JobScheduler stopped");
    }

    /// Apply one command; returns false once the scheduler should stop
    async fn handle_command(&mut self, cmd: SchedulerCommand) -> bool {
        match cmd {
            SchedulerCommand::Submit { job, reply } => {
                let _ = reply.send(self.submit(job));
            }

            SchedulerCommand::Resubmit { job, reply } => {
                if self.cancel(job.component_id()) {
                    debug!(component_id = %job.component_id(), "JobScheduler: replaced tracked job");
                }
                let _ = reply.send(self.submit(job));
            }

            SchedulerCommand::Cancel { component_id, reply } => {
                let _ = reply.send(self.cancel(&component_id));
            }

            SchedulerCommand::CloseDocument { document_id, reply } => {
                let _ = reply.send(self.close_document(&document_id).await);
            }

            SchedulerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            SchedulerCommand::QueueDetails { reply } => {
                let _ = reply.send(self.registry.entries());
            }

            SchedulerCommand::Shutdown { reply } => {
                let discarded = self.shutdown().await;
                let _ = reply.send(discarded);
                return false;
            }
        }
        true
    }

    fn submit(&mut self, job: RenderJob) -> SchedulerResponse<JobHandle> {
        let component_id = job.component_id().clone();
        debug!(%component_id, document_id = %job.document_id, "JobScheduler::submit: called");

        let (reply_tx, reply_rx) = oneshot::channel();
        if let Err(e) = self.registry.insert(job, reply_tx) {
            warn!(%component_id, "Duplicate submission rejected");
            self.stats.total_rejected += 1;
            return Err(e);
        }

        self.stats.total_submitted += 1;
        self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.registry.queued_count());

        if self.gate.arm() {
            debug!(%component_id, "JobScheduler::submit: armed debounce gate");
        } else if self.gate.is_draining() && self.registry.running_count() < self.max_jobs {
            // A free slot means no completion is due to pick this job up
            self.gate.rearm();
            debug!(%component_id, "JobScheduler::submit: re-armed debounce gate during drain");
        }

        Ok(JobHandle::new(component_id, reply_rx))
    }

    /// Unknown ids are a no-op and return false
    fn cancel(&mut self, component_id: &ComponentId) -> bool {
        debug!(%component_id, "JobScheduler::cancel: called");
        let Some(previous) = self.registry.cancel(component_id) else {
            debug!(%component_id, "JobScheduler::cancel: no tracked job");
            return false;
        };

        info!(%component_id, was = %previous, "Job cancelled");
        self.stats.total_cancelled += 1;
        if previous == JobState::Running {
            self.release_slot();
        } else if self.registry.is_empty() {
            self.settle();
        }
        true
    }

    async fn close_document(&mut self, document_id: &DocumentId) -> usize {
        debug!(%document_id, "JobScheduler::close_document: called");
        let cancelled = self.registry.cancel_document(document_id);
        self.stats.total_cancelled += cancelled.len() as u64;

        let evicted = self.renderers.evict_document(document_id).await;
        info!(%document_id, cancelled = cancelled.len(), evicted, "Document closed");

        if !cancelled.is_empty() {
            self.release_slot();
        }
        cancelled.len()
    }

    fn on_gate_expired(&mut self) {
        if self.gate.fire() {
            debug!(queued = self.registry.queued_count(), "JobScheduler: quiet period elapsed");
            self.stats.total_drains += 1;
            self.drain();
        }
    }

    fn on_render_finished(&mut self, finished: RenderFinished) {
        let RenderFinished {
            component_id,
            token,
            result,
        } = finished;

        match self.registry.complete(&component_id, token, result) {
            Some(JobState::Completed) => {
                debug!(%component_id, "Job completed");
                self.stats.total_completed += 1;
            }
            Some(state) => {
                debug!(%component_id, %state, "Job finished unsuccessfully");
                self.stats.total_failed += 1;
            }
            None => {
                // Cancelled while running; its slot was already released
                debug!(%component_id, token, "Discarding result for untracked job");
                self.stats.total_discarded += 1;
                return;
            }
        }

        self.release_slot();
    }

    /// A Running job left the registry: keep the cycle moving or go idle
    fn release_slot(&mut self) {
        match self.gate.state() {
            GateState::Draining => self.drain(),
            _ if self.registry.is_empty() => self.settle(),
            _ => {}
        }
    }

    /// Promote Queued jobs until the cap is hit or nothing is queued
    fn drain(&mut self) {
        while self.registry.running_count() < self.max_jobs {
            let Some((job, token)) = self.registry.promote_next() else {
                break;
            };
            debug!(component_id = %job.component_id(), token, "JobScheduler::drain: starting job");
            self.stats.peak_running = self.stats.peak_running.max(self.registry.running_count());
            self.spawn_render(job, token);
        }

        if self.registry.is_empty() {
            self.settle();
        } else {
            debug!(
                running = self.registry.running_count(),
                queued = self.registry.queued_count(),
                "JobScheduler::drain: cap reached or waiting on running jobs"
            );
        }
    }

    fn spawn_render(&mut self, job: RenderJob, token: u64) {
        self.tasks.spawn(run_render(
            self.renderers.clone(),
            self.bounds.clone(),
            job,
            token,
            self.finished_tx.clone(),
        ));
    }

    fn settle(&mut self) {
        if !self.gate.is_idle() {
            info!("Scheduler quiescent");
        }
        self.gate.settle();
    }

    fn snapshot(&self) -> QueueState {
        QueueState {
            queued: self.registry.queued_count(),
            running: self.registry.running_count(),
            max_jobs: self.max_jobs,
            gate: self.gate.status(),
            stats: self.stats.clone(),
        }
    }

    async fn shutdown(&mut self) -> usize {
        debug!("JobScheduler::shutdown: called");
        let discarded = self.registry.cancel_all();
        self.stats.total_cancelled += discarded as u64;
        self.tasks.abort_all();
        self.gate.settle();
        self.renderers.clear().await;
        info!(discarded, "JobScheduler shut down");
        discarded
    }
}
