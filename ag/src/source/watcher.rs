//! Change watcher implementation

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::ChangeEvent;
use crate::scheduler::{SchedulerError, SchedulerResponse, WeakRenderJobManager};

/// Forwards change events from the document source into the scheduler
pub struct ChangeWatcher {
    manager: WeakRenderJobManager,
    events: mpsc::Receiver<ChangeEvent>,
}

impl ChangeWatcher {
    pub fn new(manager: WeakRenderJobManager, events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { manager, events }
    }

    /// Apply a single event to the scheduler
    pub async fn apply(&self, event: ChangeEvent) -> SchedulerResponse<()> {
        debug!(?event, "ChangeWatcher::apply: called");
        let manager = self.manager.upgrade().ok_or(SchedulerError::ChannelClosed)?;
        match event {
            ChangeEvent::ComponentChanged { .. } => {
                if let Some(job) = event.render_job() {
                    // Outcome is reported through the scheduler's logs
                    manager.resubmit(job).await?;
                }
            }
            ChangeEvent::ComponentRemoved { component_id } => {
                manager.cancel(&component_id).await?;
            }
            ChangeEvent::DocumentClosed { document_id } => {
                manager.close_document(&document_id).await?;
            }
        }
        Ok(())
    }

    /// Run the watcher loop
    ///
    /// This runs until the event stream or the scheduler closes.
    pub async fn run(mut self) {
        info!("ChangeWatcher started");

        while let Some(event) = self.events.recv().await {
            match self.apply(event).await {
                Ok(()) => {}
                Err(SchedulerError::ChannelClosed) => {
                    warn!("Scheduler closed, stopping change watcher");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to apply change event");
                }
            }
        }

        info!("Change source closed");
    }
}
