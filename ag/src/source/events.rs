//! Change notifications from the document source

use serde::{Deserialize, Serialize};

use crate::domain::{Component, ComponentId, DocumentId, LayerId};
use crate::scheduler::RenderJob;

/// A change the document source reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A component was added or its layer changed; it needs a fresh render
    ComponentChanged {
        document_id: DocumentId,
        layer_id: LayerId,
        component: Component,
    },
    /// A component no longer exists
    ComponentRemoved { component_id: ComponentId },
    /// The document was closed
    DocumentClosed { document_id: DocumentId },
}

impl ChangeEvent {
    /// The render job a change asks for, if any
    pub fn render_job(&self) -> Option<RenderJob> {
        match self {
            Self::ComponentChanged {
                document_id,
                layer_id,
                component,
            } => Some(RenderJob::new(document_id.clone(), layer_id.clone(), component.clone())),
            _ => None,
        }
    }
}
