//! Renderer collaborator traits
//!
//! The scheduler never draws anything itself. It talks to three narrow
//! seams: a factory that builds renderers per document, the renderers
//! themselves, and a provider of exact layer bounds.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::RenderError;
use crate::domain::{Bounds, BoundsQuery, Component, DocumentId, LayerId, RenderArtifact};

/// Turns a layer/component pair into output
///
/// One instance is shared by every render of its document, so
/// implementations must accept concurrent calls.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        layer_id: &LayerId,
        component: &Component,
        exact_bounds: Option<&Bounds>,
    ) -> Result<RenderArtifact, RenderError>;
}

/// Builds renderers for a document
#[async_trait]
pub trait RendererFactory: Send + Sync {
    async fn create_vector(&self, document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError>;

    async fn create_raster(&self, document_id: &DocumentId) -> Result<Arc<dyn Renderer>, RenderError>;
}

/// Answers exact pixel bounds for a layer
#[async_trait]
pub trait BoundsProvider: Send + Sync {
    async fn exact_bounds(
        &self,
        document_id: &DocumentId,
        layer_id: &LayerId,
        query: BoundsQuery,
    ) -> Result<Bounds, RenderError>;
}
