//! File-backed cart storage.
//!
//! The cart payload lives in `<dir>/kenzyCart.json`. Writes go to a sibling
//! temp file that is then renamed over the target, so a crash mid-write
//! leaves either the old or the new payload.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use kenzy_core::cart::{CART_STORAGE_KEY, CartStorage, StorageError};
use tracing::debug;

/// Durable single-slot cart storage on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Storage in `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    /// Full path of the payload file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp)?;
        file.write_all(payload.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), bytes = payload.len(), "Cart saved");
        Ok(())
    }
}
