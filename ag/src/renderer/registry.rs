//! RendererRegistry - lazy per-document renderer cache

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use super::error::RenderError;
use super::traits::{Renderer, RendererFactory};
use crate::domain::{DocumentId, RendererKind};

type RendererSlot = Arc<OnceCell<Arc<dyn Renderer>>>;

/// Caches one renderer per (document, kind)
///
/// Construction goes through a per-key cell: concurrent first requests
/// for the same key build once, and a failed build leaves the cell empty
/// so the next request retries.
pub struct RendererRegistry {
    factory: Arc<dyn RendererFactory>,
    slots: Mutex<HashMap<(DocumentId, RendererKind), RendererSlot>>,
}

impl RendererRegistry {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get the renderer for a document, constructing it on first use
    pub async fn get(&self, document_id: &DocumentId, kind: RendererKind) -> Result<Arc<dyn Renderer>, RenderError> {
        debug!(%document_id, %kind, "RendererRegistry::get: called");
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry((document_id.clone(), kind)).or_default().clone()
        };

        let renderer = slot
            .get_or_try_init(|| async {
                debug!(%document_id, %kind, "RendererRegistry::get: constructing renderer");
                let renderer = match kind {
                    RendererKind::Vector => self.factory.create_vector(document_id).await,
                    RendererKind::Raster => self.factory.create_raster(document_id).await,
                }?;
                info!(%document_id, %kind, "Renderer constructed");
                Ok::<_, RenderError>(renderer)
            })
            .await?;

        Ok(renderer.clone())
    }

    /// Drop every cached renderer of a document
    pub async fn evict_document(&self, document_id: &DocumentId) -> usize {
        debug!(%document_id, "RendererRegistry::evict_document: called");
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|(doc, _), _| doc != document_id);
        before - slots.len()
    }

    /// Drop all cached renderers
    pub async fn clear(&self) {
        debug!("RendererRegistry::clear: called");
        self.slots.lock().await.clear();
    }

    /// Number of renderers actually constructed and cached
    pub async fn cached_count(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bounds, Component, LayerId, RenderArtifact};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct NullRenderer;

    #[async_trait]
    impl Renderer for NullRenderer {
        async fn render(
            &self,
            _layer_id: &LayerId,
            component: &Component,
            _exact_bounds: Option<&Bounds>,
        ) -> Result<RenderArtifact, RenderError> {
            Ok(RenderArtifact {
                component_id: component.id.clone(),
                width: 0,
                height: 0,
                data: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        vector_builds: AtomicUsize,
        raster_builds: AtomicUsize,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl RendererFactory for CountingFactory {
        async fn create_vector(&self, _document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
            self.vector_builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullRenderer))
        }

        async fn create_raster(&self, document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
            self.raster_builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RenderError::Construction {
                    kind: RendererKind::Raster,
                    document_id: document_id.clone(),
                    message: "device lost".to_string(),
                });
            }
            Ok(Arc::new(NullRenderer))
        }
    }

    #[tokio::test]
    async fn test_get_caches_per_document_and_kind() {
        let factory = Arc::new(CountingFactory::default());
        let registry = RendererRegistry::new(factory.clone());
        let doc = DocumentId::new("1");

        let first = registry.get(&doc, RendererKind::Raster).await.unwrap();
        let second = registry.get(&doc, RendererKind::Raster).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.raster_builds.load(Ordering::SeqCst), 1);

        registry.get(&doc, RendererKind::Vector).await.unwrap();
        registry.get(&DocumentId::new("2"), RendererKind::Raster).await.unwrap();
        assert_eq!(factory.vector_builds.load(Ordering::SeqCst), 1);
        assert_eq!(factory.raster_builds.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_requests_construct_once() {
        let factory = Arc::new(CountingFactory::default());
        let registry = RendererRegistry::new(factory.clone());
        let doc = DocumentId::new("1");

        let (a, b) = tokio::join!(
            registry.get(&doc, RendererKind::Raster),
            registry.get(&doc, RendererKind::Raster)
        );
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(factory.raster_builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_construction_is_not_cached() {
        let factory = Arc::new(CountingFactory::default());
        factory.fail_next.store(true, Ordering::SeqCst);
        let registry = RendererRegistry::new(factory.clone());
        let doc = DocumentId::new("1");

        let err = registry.get(&doc, RendererKind::Raster).await.err().unwrap();
        assert!(err.is_construction());
        assert_eq!(registry.cached_count().await, 0);

        // Next call retries construction
        assert!(registry.get(&doc, RendererKind::Raster).await.is_ok());
        assert_eq!(factory.raster_builds.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_count().await, 1);
    }

    #[tokio::test]
    async fn test_evict_document_forces_rebuild() {
        let factory = Arc::new(CountingFactory::default());
        let registry = RendererRegistry::new(factory.clone());
        let doc = DocumentId::new("1");
        let other = DocumentId::new("2");

        registry.get(&doc, RendererKind::Raster).await.unwrap();
        registry.get(&doc, RendererKind::Vector).await.unwrap();
        registry.get(&other, RendererKind::Raster).await.unwrap();

        assert_eq!(registry.evict_document(&doc).await, 2);
        assert_eq!(registry.cached_count().await, 1);

        registry.get(&doc, RendererKind::Raster).await.unwrap();
        assert_eq!(factory.raster_builds.load(Ordering::SeqCst), 3);

        registry.clear().await;
        assert_eq!(registry.cached_count().await, 0);
    }
}
