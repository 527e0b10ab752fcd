//! File-based key-value storage for Jot.
//!
//! Each key is stored as one JSON file:
//!
//! ```text
//! .jot/
//!   .lock                    # Lock file for atomic writes
//!   notes.json               # NOTES
//!   tags.json                # TAGS
//! ```

use fs2::FileExt;
use jot_core::{Error, KeyValueStore};
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-based store implementation.
#[derive(Debug)]
pub struct FilesStore {
    root: PathBuf,
}

impl FilesStore {
    /// Open a file-based store at the given .jot directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .map_err(|e| Error::Storage(format!("Failed to create store dir: {}", e)))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire an exclusive lock on the store.
    fn lock(&self) -> Result<FileLock, Error> {
        let lock_path = self.root.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| Error::Storage(format!("Failed to open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::Storage(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }

    /// Get the path of the file backing `key`.
    fn key_path(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Validation(format!("invalid store key: {:?}", key)));
        }

        Ok(self.root.join(format!("{}.json", key.to_lowercase())))
    }
}

/// RAII guard for file locking.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl KeyValueStore for FilesStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.key_path(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write the value to disk atomically.
    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.key_path(key)?;
        let temp_path = path.with_extension("json.tmp");

        let _lock = self.lock()?;

        // Write to temp file
        let mut file = File::create(&temp_path)
            .map_err(|e| Error::Storage(format!("Failed to create temp file: {}", e)))?;

        file.write_all(value.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to write temp file: {}", e)))?;

        file.sync_all()
            .map_err(|e| Error::Storage(format!("Failed to sync temp file: {}", e)))?;

        // Atomic rename
        fs::rename(&temp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to rename temp file: {}", e)))?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
