//! Synthetic renderer backend
//!
//! Produces blank RGBA pixmaps after a configurable delay. Stands in for a
//! real rendering engine when exercising the scheduler from the CLI.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::RenderError;
use super::traits::{BoundsProvider, Renderer, RendererFactory};
use crate::domain::{Bounds, BoundsQuery, Component, DocumentId, LayerId, RenderArtifact, RendererKind};

/// Configuration for the synthetic backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Simulated render time in milliseconds
    #[serde(rename = "latency-ms", default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Fail every Nth render (0 disables failure injection)
    #[serde(rename = "fail-every", default)]
    pub fail_every: u64,

    /// Layer width reported by the bounds query
    #[serde(rename = "layer-width", default = "default_layer_size")]
    pub layer_width: u32,

    /// Layer height reported by the bounds query
    #[serde(rename = "layer-height", default = "default_layer_size")]
    pub layer_height: u32,
}

fn default_latency_ms() -> u64 {
    50
}

fn default_layer_size() -> u32 {
    64
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            latency_ms: 50,
            fail_every: 0,
            layer_width: 64,
            layer_height: 64,
        }
    }
}

impl SyntheticConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Renderer factory and bounds provider in one
pub struct SyntheticBackend {
    config: SyntheticConfig,
    renders: Arc<AtomicU64>,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        debug!(?config, "SyntheticBackend::new: called");
        Self {
            config,
            renders: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total renders attempted across every renderer built by this backend
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    fn build(&self, kind: RendererKind, document_id: &DocumentId) -> Arc<dyn Renderer> {
        Arc::new(SyntheticRenderer {
            kind,
            document_id: document_id.clone(),
            config: self.config.clone(),
            renders: self.renders.clone(),
        })
    }
}

#[async_trait]
impl RendererFactory for SyntheticBackend {
    async fn create_vector(&self, document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
        Ok(self.build(RendererKind::Vector, document_id))
    }

    async fn create_raster(&self, document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError> {
        Ok(self.build(RendererKind::Raster, document_id))
    }
}

#[async_trait]
impl BoundsProvider for SyntheticBackend {
    async fn exact_bounds(
        &self,
        document_id: &DocumentId,
        layer_id: &LayerId,
        query: BoundsQuery,
    ) -> Result<Bounds, RenderError> {
        debug!(%document_id, %layer_id, ?query, "SyntheticBackend::exact_bounds: called");
        Ok(Bounds::new(
            0,
            0,
            self.config.layer_height as i32,
            self.config.layer_width as i32,
        ))
    }
}

struct SyntheticRenderer {
    kind: RendererKind,
    document_id: DocumentId,
    config: SyntheticConfig,
    renders: Arc<AtomicU64>,
}

#[async_trait]
impl Renderer for SyntheticRenderer {
    async fn render(
        &self,
        layer_id: &LayerId,
        component: &Component,
        exact_bounds: Option<&Bounds>,
    ) -> Result<RenderArtifact, RenderError> {
        debug!(
            kind = %self.kind,
            document_id = %self.document_id,
            %layer_id,
            component_id = %component.id,
            "SyntheticRenderer::render: called"
        );
        tokio::time::sleep(self.config.latency()).await;

        let n = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        if self.config.fail_every > 0 && n % self.config.fail_every == 0 {
            return Err(RenderError::Render(format!("synthetic failure on render #{}", n)));
        }

        let (width, height) = match exact_bounds {
            Some(bounds) => (bounds.width(), bounds.height()),
            None => (self.config.layer_width, self.config.layer_height),
        };
        let scale = component.scale_factor();
        let width = (width as f32 * scale).round() as u32;
        let height = (height as f32 * scale).round() as u32;

        Ok(RenderArtifact {
            component_id: component.id.clone(),
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyntheticConfig::default();
        assert_eq!(config.latency(), Duration::from_millis(50));
        assert_eq!(config.fail_every, 0);
        assert_eq!((config.layer_width, config.layer_height), (64, 64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_sizes_from_bounds_and_scale() {
        let backend = SyntheticBackend::new(SyntheticConfig::default());
        let doc = DocumentId::new("1");
        let renderer = backend.create_raster(&doc).await.unwrap();

        let component = Component::new("c1", "png").with_scale(0.5);
        let bounds = Bounds::new(0, 0, 20, 40);
        let artifact = renderer
            .render(&LayerId::new("3"), &component, Some(&bounds))
            .await
            .unwrap();

        assert_eq!((artifact.width, artifact.height), (20, 10));
        assert_eq!(artifact.data.len(), 20 * 10 * 4);
        assert_eq!(backend.render_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_every_injects_failures() {
        let backend = SyntheticBackend::new(SyntheticConfig {
            fail_every: 2,
            ..Default::default()
        });
        let renderer = backend.create_vector(&DocumentId::new("1")).await.unwrap();
        let layer = LayerId::new("3");
        let component = Component::new("c1", "svg");

        assert!(renderer.render(&layer, &component, None).await.is_ok());
        assert!(renderer.render(&layer, &component, None).await.is_err());
        assert!(renderer.render(&layer, &component, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_bounds_match_configured_layer_size() {
        let backend = SyntheticBackend::new(SyntheticConfig {
            layer_width: 30,
            layer_height: 12,
            ..Default::default()
        });
        let bounds = backend
            .exact_bounds(&DocumentId::new("1"), &LayerId::new("2"), BoundsQuery::bounds_only())
            .await
            .unwrap();
        assert_eq!((bounds.width(), bounds.height()), (30, 12));
    }
}
