//! Domain types for assetgen
//!
//! Documents own layers, layers own components. A component is the unit
//! of render work; its id is the key the job scheduler tracks.

mod component;
mod id;

pub use component::{Bounds, BoundsQuery, Component, RenderArtifact, RendererKind};
pub use id::{ComponentId, DocumentId, LayerId};
