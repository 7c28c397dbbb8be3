//! assetgen - Debounced, concurrency-bounded component render scheduler
//!
//! A document is made of layers, and layers hold components that are exported
//! as image assets. Edits arrive in bursts, so assetgen holds render work back
//! until the document has been quiet for a while, then renders components
//! with at most `max_jobs` renders in flight.
//!
//! # Core Concepts
//!
//! - **One job per component**: a component id has at most one queued or
//!   running job; resubmitting replaces it
//! - **Debounce**: submissions arm a quiet-period timer; nothing starts
//!   rendering until it fires
//! - **Bounded dispatch**: a drain cycle keeps the running count at the cap
//!   and each completion pulls in the next queued job
//! - **Cached renderers**: one vector and one raster renderer per document,
//!   constructed on first use
//!
//! # Modules
//!
//! - [`domain`] - Document, layer and component types
//! - [`renderer`] - Renderer traits, the per-document cache and a synthetic backend
//! - [`scheduler`] - Job registry, debounce gate and the scheduler actor
//! - [`source`] - Change events from the document source
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod renderer;
pub mod scheduler;
pub mod source;

pub use config::Config;
pub use domain::{Bounds, BoundsQuery, Component, ComponentId, DocumentId, LayerId, RenderArtifact, RendererKind};
pub use renderer::{BoundsProvider, RenderError, Renderer, RendererFactory, RendererRegistry};
pub use scheduler::{
    JobHandle, JobOutcome, JobState, QueueState, RenderJob, RenderJobManager, SchedulerConfig, SchedulerError,
};
pub use source::ChangeEvent;
