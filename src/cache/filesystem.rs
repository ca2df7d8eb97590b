//! Directory-backed cache store
//!
//! One file per key, named by the key's hex digest. Writes go to a
//! temporary file first and are renamed into place, so a reader never sees
//! a partially written entry.

use crate::cache::{CacheKey, CacheStore};
use crate::error::{MillError, MillResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache store persisting entries as files in a directory
#[derive(Debug, Clone)]
pub struct FileSystemCache {
    directory: PathBuf,
}

impl FileSystemCache {
    /// Open a cache in `directory`, creating it if needed
    pub fn new(directory: impl Into<PathBuf>) -> MillResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| {
            MillError::io(format!("creating cache directory {}", directory.display()), e)
        })?;
        Ok(Self { directory })
    }

    /// Default cache location (`~/.cache/assetmill/`)
    pub fn default_directory() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assetmill")
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.as_str())
    }
}

impl CacheStore for FileSystemCache {
    fn get(&self, key: &CacheKey) -> MillResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MillError::io(
                format!("reading cache entry {}", path.display()),
                e,
            )),
        }
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> MillResult<()> {
        let path = self.entry_path(key);
        let tmp = self
            .directory
            .join(format!(".{}.{}.tmp", key.as_str(), uuid::Uuid::new_v4()));

        let written = fs::write(&tmp, value)
            .map_err(|e| MillError::io(format!("writing cache entry {}", tmp.display()), e))
            .and_then(|()| {
                fs::rename(&tmp, &path).map_err(|e| {
                    MillError::io(format!("moving cache entry into {}", path.display()), e)
                })
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!("Wrote {} bytes to cache entry {}", value.len(), path.display());
        Ok(())
    }
}
