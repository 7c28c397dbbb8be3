//! Renderer error types

use thiserror::Error;

use crate::domain::{DocumentId, LayerId, RendererKind};

/// Errors that can occur while producing a component's output
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Failed to construct {kind} renderer for document {document_id}: {message}")]
    Construction {
        kind: RendererKind,
        document_id: DocumentId,
        message: String,
    },

    #[error("Bounds query failed for layer {layer_id}: {message}")]
    Bounds { layer_id: LayerId, message: String },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Render task ended without reporting a result")]
    Aborted,
}

impl RenderError {
    /// Check if the renderer itself could not be built
    pub fn is_construction(&self) -> bool {
        matches!(self, RenderError::Construction { .. })
    }
}
