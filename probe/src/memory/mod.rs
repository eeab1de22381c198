//! Stand-alone in-memory host
//!
//! Implements every collaborator trait in [`crate::host`] over plain collections. Used by the
//! crate's own tests and by embedders that want a graph without a running application.

mod catalog;
mod observer;
mod resources;
mod scene;

pub use catalog::MemoryCatalog;
pub use observer::{Notification, RecordingObserver};
pub use resources::MemoryResources;
pub use scene::MemoryScene;
