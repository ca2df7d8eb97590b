//! Gzip compression filter
//!
//! Useful to pre-compress bundles when the web server cannot do it on the
//! fly. The server still has to be configured to send the files marked as
//! gzipped. Gzip output is binary, so the filter belongs in chains applied to
//! binary hunks; convert merged text with [`MemoryHunk::into_binary`].
//!
//! [`MemoryHunk::into_binary`]: crate::hunk::MemoryHunk::into_binary

use crate::error::{MillError, MillResult};
use crate::filter::{Capabilities, Capability, Filter, FilterOptions};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// Compression level used when none is given
pub const DEFAULT_LEVEL: u32 = 6;

/// Applies gzip compression as an `output` transform
#[derive(Debug, Clone)]
pub struct GzipFilter {
    level: u32,
}

impl GzipFilter {
    pub fn new() -> Self {
        Self::with_level(DEFAULT_LEVEL)
    }

    /// Compression level, clamped to 0..=9
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for GzipFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for GzipFilter {
    fn name(&self) -> &str {
        "gzip"
    }

    fn identity(&self) -> String {
        format!("gzip:level={}", self.level)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.with(Capability::Output)
    }

    fn output(
        &self,
        input: &mut dyn Read,
        out: &mut dyn Write,
        _options: &FilterOptions,
    ) -> MillResult<()> {
        let mut encoder = GzEncoder::new(out, Compression::new(self.level));
        io::copy(input, &mut encoder).map_err(|e| MillError::filter(self.name(), e))?;
        encoder
            .finish()
            .map_err(|e| MillError::filter(self.name(), e))?;
        Ok(())
    }
}
