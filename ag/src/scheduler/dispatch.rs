//! Render path for promoted jobs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::job::RenderJob;
use super::messages::RenderFinished;
use crate::domain::{BoundsQuery, ComponentId, RenderArtifact, RendererKind};
use crate::renderer::{BoundsProvider, RenderError, RendererRegistry};

/// Render one job
///
/// Vector components go straight to the document's pixmap renderer with
/// no explicit bounds. Everything else asks for the layer's exact bounds
/// first and renders with them.
pub async fn render_job(
    renderers: &RendererRegistry,
    bounds: &dyn BoundsProvider,
    job: &RenderJob,
) -> Result<RenderArtifact, RenderError> {
    debug!(
        component_id = %job.component_id(),
        document_id = %job.document_id,
        layer_id = %job.layer_id,
        kind = %job.component.kind(),
        "render_job: called"
    );
    let renderer = renderers.get(&job.document_id, RendererKind::Raster).await?;

    if job.component.is_vector() {
        debug!(component_id = %job.component_id(), "render_job: vector branch, skipping bounds query");
        return renderer.render(&job.layer_id, &job.component, None).await;
    }

    let exact = bounds
        .exact_bounds(&job.document_id, &job.layer_id, BoundsQuery::bounds_only())
        .await?;
    debug!(component_id = %job.component_id(), ?exact, "render_job: got exact bounds");
    renderer.render(&job.layer_id, &job.component, Some(&exact)).await
}

/// Reports a render task's end to the scheduler exactly once
///
/// Dropping the guard without calling [`FinishGuard::finish`] (panic,
/// abort) still reports, as [`RenderError::Aborted`], so the slot is
/// always released.
pub(crate) struct FinishGuard {
    tx: mpsc::UnboundedSender<RenderFinished>,
    component_id: ComponentId,
    token: u64,
    result: Option<Result<RenderArtifact, RenderError>>,
}

impl FinishGuard {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RenderFinished>, component_id: ComponentId, token: u64) -> Self {
        Self {
            tx,
            component_id,
            token,
            result: None,
        }
    }

    pub(crate) fn finish(mut self, result: Result<RenderArtifact, RenderError>) {
        self.result = Some(result);
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or(Err(RenderError::Aborted));
        // Closed only once the scheduler itself is gone
        let _ = self.tx.send(RenderFinished {
            component_id: self.component_id.clone(),
            token: self.token,
            result,
        });
    }
}

/// Body of a spawned render task
pub(crate) async fn run_render(
    renderers: Arc<RendererRegistry>,
    bounds: Arc<dyn BoundsProvider>,
    job: RenderJob,
    token: u64,
    finished_tx: mpsc::UnboundedSender<RenderFinished>,
) {
    let guard = FinishGuard::new(finished_tx, job.component_id().clone(), token);
    let result = render_job(&renderers, bounds.as_ref(), &job).await;
    if let Err(e) = &result {
        error!(
            document_id = %job.document_id,
            layer_id = %job.layer_id,
            component_id = %job.component_id(),
            error = %e,
            "Render failed"
        );
    }
    guard.finish(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bounds, Component, DocumentId, LayerId};
    use crate::renderer::{Renderer, RendererFactory};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        renders: Mutex<Vec<(String, Option<Bounds>)>>,
        bounds_queries: Mutex<Vec<(String, BoundsQuery)>>,
        raster_builds: Mutex<usize>,
        vector_builds: Mutex<usize>,
    }

    struct RecordingRenderer(Arc<Recorder>);

    #[async_trait]
    impl Renderer for RecordingRenderer {
        async fn render(
            &self,
            _layer_id: &LayerId,
            component: &Component,
            exact_bounds: Option<&Bounds>,
        ) -> Result<RenderArtifact, RenderError> {
            self.0
                .renders
                .lock()
                .unwrap()
                .push((component.id.to_string(), exact_bounds.copied()));
            if component.id.as_str() == "broken" {
                return Err(RenderError::Render("bad pixels".to_string()));
            }
            Ok(RenderArtifact {
                component_id: component.id.clone(),
                width: 2,
                height: 2,
                data: vec![0; 16],
            })
        }
    }

    struct RecordingBackend(Arc<Recorder>);

    #[async_trait]
    impl RendererFactory for RecordingBackend {
        async fn create_vector(&self, _document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
            *self.0.vector_builds.lock().unwrap() += 1;
            Ok(Arc::new(RecordingRenderer(self.0.clone())))
        }

        async fn create_raster(&self, _document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
            *self.0.raster_builds.lock().unwrap() += 1;
            Ok(Arc::new(RecordingRenderer(self.0.clone())))
        }
    }

    #[async_trait]
    impl BoundsProvider for RecordingBackend {
        async fn exact_bounds(
            &self,
            _document_id: &DocumentId,
            layer_id: &LayerId,
            query: BoundsQuery,
        ) -> Result<Bounds, RenderError> {
            self.0
                .bounds_queries
                .lock()
                .unwrap()
                .push((layer_id.to_string(), query));
            Ok(Bounds::new(1, 2, 11, 22))
        }
    }

    fn setup() -> (Arc<Recorder>, RendererRegistry, RecordingBackend) {
        let recorder = Arc::new(Recorder::default());
        let registry = RendererRegistry::new(Arc::new(RecordingBackend(recorder.clone())));
        (recorder.clone(), registry, RecordingBackend(recorder))
    }

    #[tokio::test]
    async fn test_vector_component_skips_bounds_query() {
        let (recorder, registry, bounds) = setup();
        let job = RenderJob::new("doc", "layer-1", Component::new("logo", "svg"));

        render_job(&registry, &bounds, &job).await.unwrap();

        assert!(recorder.bounds_queries.lock().unwrap().is_empty());
        assert_eq!(*recorder.renders.lock().unwrap(), vec![("logo".to_string(), None)]);
        assert_eq!(*recorder.raster_builds.lock().unwrap(), 1);
        assert_eq!(*recorder.vector_builds.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_raster_component_uses_exact_bounds() {
        let (recorder, registry, bounds) = setup();
        let job = RenderJob::new("doc", "layer-1", Component::new("hero", "png"));

        render_job(&registry, &bounds, &job).await.unwrap();

        assert_eq!(
            *recorder.bounds_queries.lock().unwrap(),
            vec![("layer-1".to_string(), BoundsQuery::bounds_only())]
        );
        assert_eq!(
            *recorder.renders.lock().unwrap(),
            vec![("hero".to_string(), Some(Bounds::new(1, 2, 11, 22)))]
        );
    }

    #[tokio::test]
    async fn test_run_render_reports_result() {
        let (_recorder, registry, bounds) = setup();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let job = RenderJob::new("doc", "layer-1", Component::new("broken", "png"));

        run_render(Arc::new(registry), Arc::new(bounds), job, 7, tx).await;

        let finished = rx.recv().await.unwrap();
        assert_eq!(finished.component_id.as_str(), "broken");
        assert_eq!(finished.token, 7);
        assert_eq!(finished.result, Err(RenderError::Render("bad pixels".to_string())));
        assert!(rx.try_recv().is_err(), "reported exactly once");
    }

    #[tokio::test]
    async fn test_dropped_guard_reports_aborted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(FinishGuard::new(tx, ComponentId::new("c"), 3));

        let finished = rx.recv().await.unwrap();
        assert_eq!(finished.result, Err(RenderError::Aborted));
    }
}
