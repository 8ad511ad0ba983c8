//! Receipt file saving.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::ReceiptError;

/// Persists a finished receipt under a file name.
pub trait FileSaver: Send + Sync {
    /// Store `bytes` as `file_name` and return where they ended up.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Save` if the file cannot be written. No
    /// partial file is left behind.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReceiptError>;
}

/// Saves into a directory, writing a uniquely named temporary file and
/// renaming it into place.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReceiptError> {
        fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(file_name);

        // Dropping the temp file on an early return deletes it
        let mut partial = NamedTempFile::new_in(&self.dir)?;
        partial.write_all(bytes)?;
        partial.as_file().sync_all()?;
        partial.persist(&target).map_err(|e| e.error)?;

        tracing::debug!(path = %target.display(), bytes = bytes.len(), "Receipt saved");
        Ok(target)
    }
}
