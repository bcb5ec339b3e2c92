//! Last-response persistence for diagnostics
//!
//! Keeps the most recent raw payload per location on disk. Logging is
//! best-effort: failures are reported through `tracing` and never fail the
//! lookup that triggered them.

use crate::query::LocationQuery;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sink for raw upstream payloads
pub trait ResponseLogger: Send + Sync {
    fn log(&self, query: &LocationQuery, payload: &str);
}

/// Writes `<dir>/<location>.json`, replacing the previous response
#[derive(Debug, Clone)]
pub struct FileResponseLogger {
    dir: PathBuf,
}

impl FileResponseLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the payload for `query` ends up
    pub fn path_for(&self, query: &LocationQuery) -> PathBuf {
        self.dir.join(format!("{}.json", query.file_stem()))
    }

    fn write(&self, path: &Path, payload: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, payload)
    }
}

impl ResponseLogger for FileResponseLogger {
    fn log(&self, query: &LocationQuery, payload: &str) {
        let path = self.path_for(query);
        match self.write(&path, payload) {
            Ok(()) => debug!("Logged response for {} to {}", query, path.display()),
            Err(e) => warn!("Failed to log response to {}: {}", path.display(), e),
        }
    }
}
