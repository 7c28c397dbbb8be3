//! Renderer seams and the per-document renderer cache

mod error;
mod registry;
mod synthetic;
mod traits;

pub use error::RenderError;
pub use registry::RendererRegistry;
pub use synthetic::{SyntheticBackend, SyntheticConfig};
pub use traits::{BoundsProvider, Renderer, RendererFactory};
