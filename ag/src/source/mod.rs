//! Document change source
//!
//! The ChangeWatcher consumes change notifications and turns them into
//! resubmissions, cancellations and document teardown.

mod events;
mod watcher;

pub use events::ChangeEvent;
pub use watcher::ChangeWatcher;
