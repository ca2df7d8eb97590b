//! assetmill - hunk merging and cache-aware filter application
//!
//! Combines content sources ("hunks"), runs ordered filter chains over them,
//! and caches results by content so repeated builds with unchanged inputs
//! skip the work.

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod filter;
pub mod hunk;
pub mod logging;
pub mod tool;

pub use cache::{CacheKey, CacheStore, FileSystemCache, MemoryCache};
pub use content::{Content, ContentKind, Fingerprint};
pub use error::{MillError, MillResult};
pub use filter::{
    merge_filter_lists, select_filters, select_filters_by, Capabilities, Capability, DebugLevel,
    Filter, FilterChain, FilterEntry, FilterOptions, GzipFilter, ProducerArg, ProducerKind,
    TransformKind,
};
pub use hunk::{merge, merge_with, FileHunk, Hunk, MemoryHunk, UrlHunk};
pub use tool::FilterTool;
