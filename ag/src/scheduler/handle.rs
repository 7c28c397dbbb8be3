//! RenderJobManager - client interface for the scheduler actor

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::config::SchedulerConfig;
use super::core::JobScheduler;
use super::job::{JobHandle, RenderJob};
use super::messages::{SchedulerCommand, SchedulerError, SchedulerResponse};
use super::queue::{QueueEntry, QueueState};
use crate::domain::{ComponentId, DocumentId};
use crate::renderer::{BoundsProvider, RendererFactory, RendererRegistry};
use crate::source::{ChangeEvent, ChangeWatcher};

/// Handle to a running render job scheduler
///
/// Cloneable; every clone talks to the same scheduler task. The
/// scheduler stops on [`RenderJobManager::shutdown`] or when the last
/// clone is dropped. An attached change source only holds a
/// [`WeakRenderJobManager`] and does not keep it running.
#[derive(Clone)]
pub struct RenderJobManager {
    tx: mpsc::Sender<SchedulerCommand>,
    /// Task forwarding change events, if a source is attached
    source: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// Non-owning handle; see [`RenderJobManager::downgrade`]
#[derive(Clone)]
pub struct WeakRenderJobManager {
    tx: mpsc::WeakSender<SchedulerCommand>,
}

impl WeakRenderJobManager {
    /// A usable handle, or `None` once every owning handle is gone
    pub fn upgrade(&self) -> Option<RenderJobManager> {
        self.tx.upgrade().map(RenderJobManager::from_sender)
    }
}

impl RenderJobManager {
    fn from_sender(tx: mpsc::Sender<SchedulerCommand>) -> Self {
        Self {
            tx,
            source: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn a scheduler with its own renderer cache
    pub fn spawn(
        config: SchedulerConfig,
        factory: Arc<dyn RendererFactory>,
        bounds: Arc<dyn BoundsProvider>,
    ) -> Self {
        debug!(?config, "RenderJobManager::spawn: called");
        let renderers = Arc::new(RendererRegistry::new(factory));
        let (scheduler, tx) = JobScheduler::new(&config, renderers, bounds);
        tokio::spawn(scheduler.run());

        info!("RenderJobManager spawned");
        Self::from_sender(tx)
    }

    /// Handle that does not keep the scheduler alive
    pub fn downgrade(&self) -> WeakRenderJobManager {
        WeakRenderJobManager {
            tx: self.tx.downgrade(),
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand) -> SchedulerResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;
        Ok(reply_rx.await?)
    }

    /// Queue a render; fails with `DuplicateSubmission` if the component
    /// already has a queued or running job
    pub async fn submit(&self, job: RenderJob) -> SchedulerResponse<JobHandle> {
        debug!(component_id = %job.component_id(), "RenderJobManager::submit: called");
        self.request(|reply| SchedulerCommand::Submit { job, reply }).await?
    }

    /// Cancel any tracked job for the component and queue a fresh one
    pub async fn resubmit(&self, job: RenderJob) -> SchedulerResponse<JobHandle> {
        debug!(component_id = %job.component_id(), "RenderJobManager::resubmit: called");
        self.request(|reply| SchedulerCommand::Resubmit { job, reply }).await?
    }

    /// Cancel a queued or running job; false when nothing was tracked
    pub async fn cancel(&self, component_id: &ComponentId) -> SchedulerResponse<bool> {
        debug!(%component_id, "RenderJobManager::cancel: called");
        let component_id = component_id.clone();
        self.request(|reply| SchedulerCommand::Cancel { component_id, reply })
            .await
    }

    /// Cancel a document's jobs and drop its cached renderers
    pub async fn close_document(&self, document_id: &DocumentId) -> SchedulerResponse<usize> {
        debug!(%document_id, "RenderJobManager::close_document: called");
        let document_id = document_id.clone();
        self.request(|reply| SchedulerCommand::CloseDocument { document_id, reply })
            .await
    }

    /// Get current queue state
    pub async fn snapshot(&self) -> SchedulerResponse<QueueState> {
        debug!("RenderJobManager::snapshot: called");
        self.request(|reply| SchedulerCommand::Snapshot { reply }).await
    }

    /// Get per-job queue entries
    pub async fn queue_details(&self) -> SchedulerResponse<Vec<QueueEntry>> {
        debug!("RenderJobManager::queue_details: called");
        self.request(|reply| SchedulerCommand::QueueDetails { reply }).await
    }

    /// Start consuming change events; replaces any attached source
    pub async fn attach(&self, events: mpsc::Receiver<ChangeEvent>) {
        debug!("RenderJobManager::attach: called");
        let task = tokio::spawn(ChangeWatcher::new(self.downgrade(), events).run());
        if let Some(previous) = self.source.lock().await.replace(task) {
            info!("Replacing attached change source");
            previous.abort();
        }
    }

    /// Stop consuming change events; false when nothing was attached
    pub async fn detach(&self) -> bool {
        debug!("RenderJobManager::detach: called");
        match self.source.lock().await.take() {
            Some(task) => {
                task.abort();
                info!("Change source detached");
                true
            }
            None => false,
        }
    }

    /// Whether a change source is attached and still being consumed
    pub async fn is_attached(&self) -> bool {
        self.source
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Detach the change source, cancel every tracked job and stop the
    /// scheduler; returns how many jobs were discarded
    pub async fn shutdown(&self) -> SchedulerResponse<usize> {
        debug!("RenderJobManager::shutdown: called");
        self.detach().await;
        self.request(|reply| SchedulerCommand::Shutdown { reply }).await
    }
}
