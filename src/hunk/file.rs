//! Hunks backed by a local file

use crate::content::Content;
use crate::error::{MillError, MillResult};
use crate::hunk::Hunk;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Exposes a single file as a hunk.
///
/// The file is re-read on every `data()` call.
#[derive(Debug, Clone)]
pub struct FileHunk {
    path: PathBuf,
}

impl FileHunk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Hunk for FileHunk {
    fn data(&self) -> MillResult<Content> {
        let bytes = fs::read(&self.path)
            .map_err(|e| MillError::io(format!("reading {}", self.path.display()), e))?;
        Ok(Content::from_utf8_or_bytes(bytes))
    }

    fn mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn provenance(&self) -> Vec<String> {
        vec![self.path.display().to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentKind;
    use tempfile::TempDir;

    #[test]
    fn reads_text_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.js");
        fs::write(&path, "alert(1);").unwrap();

        let hunk = FileHunk::new(&path);
        assert_eq!(hunk.data().unwrap(), Content::from("alert(1);"));
        assert!(hunk.mtime().is_some());
    }

    #[test]
    fn rereads_on_every_call() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.js");
        fs::write(&path, "one").unwrap();

        let hunk = FileHunk::new(&path);
        assert_eq!(hunk.data().unwrap(), Content::from("one"));
        fs::write(&path, "two").unwrap();
        assert_eq!(hunk.data().unwrap(), Content::from("two"));
    }

    #[test]
    fn binary_file_stays_binary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logo.png");
        fs::write(&path, [0x89, b'P', b'N', b'G', 0xff]).unwrap();

        let hunk = FileHunk::new(&path);
        assert_eq!(hunk.data().unwrap().kind(), ContentKind::Binary);
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let hunk = FileHunk::new(temp.path().join("missing.css"));

        let err = hunk.data().unwrap_err();
        assert!(matches!(err, MillError::Io { .. }));
        assert!(err.to_string().contains("missing.css"));
        assert!(hunk.mtime().is_none());
    }
}
