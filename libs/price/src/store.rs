use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{FetchError, Result};
use crate::history::PriceHistory;

/// The JSON file the static site reads prices from.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty history. A file that exists but does not
    /// parse is an error, and is left exactly as it was found.
    pub fn load(&self) -> Result<PriceHistory> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no history file yet, starting empty");
                return Ok(PriceHistory::default());
            }
            Err(e) => return Err(FetchError::io(&self.path, e)),
        };

        let history: PriceHistory =
            serde_json::from_slice(&bytes).map_err(|source| FetchError::PersistedStateCorrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            entries = history.len(),
            "loaded history"
        );

        Ok(history)
    }

    /// Replace the file with `history`.
    ///
    /// Written to a sibling temp file, synced, then renamed over the target so a
    /// reader sees either the old document or the new one.
    pub fn persist(&self, history: &PriceHistory) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| FetchError::io(dir, e))?;

        let mut body = serde_json::to_vec_pretty(history)
            .map_err(|e| FetchError::io(&self.path, std::io::Error::other(e)))?;
        body.push(b'\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FetchError::io(dir, e))?;
        tmp.write_all(&body)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| FetchError::io(tmp.path(), e))?;

        // the temp file is removed on drop if the rename fails
        tmp.persist(&self.path)
            .map_err(|e| FetchError::io(&self.path, e.error))?;

        info!(
            path = %self.path.display(),
            entries = history.len(),
            "history saved"
        );

        Ok(())
    }
}
