use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// `MakeWriter` that creates its log file (and missing parent directories) on first write
///
/// Embedding hosts that never raise the level above the default never see a file appear. If the
/// file is deleted while the process runs, the next write recreates it.
#[derive(Clone)]
pub struct LazyFileWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LazyFileWriter {
    /// Writer for `path`; nothing touches the filesystem yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// Target file
    pub fn path(&self) -> &Path { &self.path }
}

/// Per-event writer sharing the lazily opened handle
pub struct LazyWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LazyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?;

        if guard.is_none() || !self.path.exists() {
            *guard = Some(open_append(&self.path)?);
        }

        let written = match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("log file handle missing")),
        };
        written.or_else(|_| {
            // stale handle
            let mut fresh = open_append(&self.path)?;
            let bytes = fresh.write(buf)?;
            *guard = Some(fresh);
            Ok(bytes)
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?;

        if !self.path.exists() {
            *guard = None;
            return Ok(());
        }
        match guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LazyFileWriter {
    type Writer = LazyWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LazyWriter {
            path: self.path.clone(),
            file: Arc::clone(&self.file),
        }
    }
}
