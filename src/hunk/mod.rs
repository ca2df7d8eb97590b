//! Hunks: content-bearing units with content-based identity
//!
//! A hunk gives uniform access to content regardless of where it came from:
//! a local file, a remote URL, or an in-memory buffer produced by an earlier
//! build step. Two hunks with equal `data()` are interchangeable for caching;
//! their origin and provenance never take part in identity.

pub mod file;
pub mod memory;
pub mod url;

pub use file::FileHunk;
pub use memory::MemoryHunk;
pub use url::{FetchResponse, Fetcher, UrlHunk, UreqFetcher, Validators};

use crate::content::{Content, Fingerprint};
use crate::error::{MillError, MillResult};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Separator placed between merged hunks.
///
/// A line break keeps a trailing `//` comment in one script from swallowing
/// the first statement of the next.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// A block of content from some origin
pub trait Hunk: Send + Sync + fmt::Debug {
    /// The full content. Textual origins are decoded to text.
    fn data(&self) -> MillResult<Content>;

    /// Best-effort last-modified time
    fn mtime(&self) -> Option<SystemTime> {
        None
    }

    /// Ordered identifiers of the sources this hunk was built from.
    /// Informational only.
    fn provenance(&self) -> Vec<String> {
        Vec::new()
    }

    /// Content identity
    fn fingerprint(&self) -> MillResult<Fingerprint> {
        Ok(self.data()?.fingerprint())
    }

    /// Write the content to `path` as bytes
    fn save(&self, path: &Path) -> MillResult<()> {
        let content = self.data()?;
        std::fs::write(path, content.as_bytes())
            .map_err(|e| MillError::io(format!("writing {}", path.display()), e))
    }
}

/// Whether two hunks carry identical content
pub fn same_content(a: &dyn Hunk, b: &dyn Hunk) -> MillResult<bool> {
    Ok(a.fingerprint()? == b.fingerprint()?)
}

/// Merge hunks into one, joined by [`DEFAULT_SEPARATOR`]
pub fn merge(hunks: &[Arc<dyn Hunk>]) -> MillResult<MemoryHunk> {
    merge_with(hunks, DEFAULT_SEPARATOR)
}

/// Merge hunks into one in-memory hunk, joined by `separator`.
///
/// Binary content is decoded as UTF-8 and the result is always text, so a
/// chain producing bytes (gzip) needs [`MemoryHunk::into_binary`] first. The
/// provenance of every input is carried over in order. Nothing is cached here.
pub fn merge_with(hunks: &[Arc<dyn Hunk>], separator: &str) -> MillResult<MemoryHunk> {
    let mut parts = Vec::with_capacity(hunks.len());
    let mut files = Vec::new();

    for hunk in hunks {
        parts.push(hunk.data()?.into_text()?);
        files.extend(hunk.provenance());
    }

    Ok(MemoryHunk::new(parts.join(separator)).with_files(files))
}
