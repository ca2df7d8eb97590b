//! Cache stores for filter results
//!
//! The engine treats a cache store as an opaque key to bytes map. Keys are
//! content-addressed: they hash the content fingerprint of the input together
//! with the filter identities and the operation kind, never the origin of
//! the input.
//!
//! # Key Namespaces
//!
//! | Namespace | Components | Used by |
//! |-----------|------------|---------|
//! | `hunk` | content, filters, transform kind | `FilterTool::apply` |
//! | `hunk` | arguments, filter, producer kind, extras | `FilterTool::apply_func` |
//! | `url-headers` | url | `UrlHunk` validators |
//! | `url-contents` | url | `UrlHunk` body |
//!
//! Concurrent writers racing on one key always write identical bytes, so
//! stores do not lock across a get/set pair.

pub mod filesystem;
pub mod key;
pub mod memory;

pub use filesystem::FileSystemCache;
pub use key::{CacheKey, KeyBuilder};
pub use memory::MemoryCache;

use crate::error::MillResult;

/// Opaque key to bytes store shared across build operations
pub trait CacheStore: Send + Sync {
    /// Look up a cached value
    fn get(&self, key: &CacheKey) -> MillResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &CacheKey, value: &[u8]) -> MillResult<()>;
}
