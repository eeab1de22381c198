use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, Registry};

use super::lazy_file_writer::LazyFileWriter;

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(1); // warn

/// Dynamic tracing filter that can be updated at runtime
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamicFilter;

impl<S> Layer<S> for DynamicFilter
where
    S: Subscriber,
{
    fn enabled(
        &self,
        metadata: &tracing::Metadata<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        TracingLevel::from_level(*metadata.level()).as_u8() <= CURRENT_LEVEL.load(Ordering::Relaxed)
    }
}

/// Tracing levels that can be set dynamically
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    #[default]
    Warn,
    /// Structural changes
    Info,
    /// Resolution steps
    Debug,
    /// Everything
    Trace,
}

impl TracingLevel {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        }
    }

    const fn from_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            Level::TRACE => Self::Trace,
        }
    }

    /// Install a file subscriber filtered by [`DynamicFilter`]
    ///
    /// The file is only created when the first event passes the filter. Fails if a global
    /// subscriber is already installed.
    pub fn init_file_tracing(path: impl Into<PathBuf>) -> Result<(), TryInitError> {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(LazyFileWriter::new(path))
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default()
            .with(DynamicFilter)
            .with(file_layer)
            .try_init()
    }

    /// Get the current tracing level
    pub fn current() -> Self {
        match CURRENT_LEVEL.load(Ordering::Relaxed) {
            0 => Self::Error,
            2 => Self::Info,
            3 => Self::Debug,
            4 => Self::Trace,
            _ => Self::Warn,
        }
    }

    /// Set the current tracing level dynamically
    pub fn set_current(level: Self) {
        CURRENT_LEVEL.store(level.as_u8(), Ordering::Relaxed);
        tracing::info!("Tracing level set to: {level}");
    }

    /// Default log file in the temp directory
    pub fn default_log_path() -> PathBuf { std::env::temp_dir().join("scene_probe_trace.log") }
}
