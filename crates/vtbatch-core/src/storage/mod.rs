//! Artifact storage: one file per verified download, named by identifier.
//!
//! Content is written to a uniquely named `.<name>.<random>.part` file in the
//! same directory, synced, then atomically renamed to its final name, so a
//! reader never observes a partially written artifact and concurrent writers
//! of one identifier never share a temp file.

mod writer;

pub use writer::write_atomic;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Suffix of in-flight temp files.
pub const TEMP_SUFFIX: &str = ".part";

/// Directory that receives downloaded artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.is_dir() {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("create download dir {}", self.dir.display()))?;
            tracing::debug!(dir = %self.dir.display(), "created download directory");
        }
        Ok(())
    }

    /// Final path for an artifact. Callers only pass identifiers that already
    /// matched a hex digest, so the name carries no path separators.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(identifier)
    }

    /// Persist `content` under `identifier`, replacing any existing file.
    pub fn persist(&self, identifier: &str, content: &[u8]) -> Result<PathBuf> {
        let final_path = self.path_for(identifier);
        write_atomic(&final_path, content)?;
        Ok(final_path)
    }
}
