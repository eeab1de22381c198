//! File-based tracing with a level that can change at runtime
//!
//! The crate itself only emits `tracing` events. Hosts that want them on disk call
//! [`init_from_config`] (or [`TracingLevel::init_file_tracing`]) once at startup.

mod lazy_file_writer;
mod tracing;

pub use lazy_file_writer::{LazyFileWriter, LazyWriter};
pub use tracing::{DynamicFilter, TracingLevel};
use tracing_subscriber::util::TryInitError;

use crate::config::ProbeConfig;

/// Apply the configured level and install the file subscriber
///
/// Without a configured file the default temp-directory log path is used.
pub fn init_from_config(config: &ProbeConfig) -> Result<(), TryInitError> {
    let path = config
        .log_file
        .clone()
        .unwrap_or_else(TracingLevel::default_log_path);
    let installed = TracingLevel::init_file_tracing(path);
    TracingLevel::set_current(config.log_level);
    installed
}
