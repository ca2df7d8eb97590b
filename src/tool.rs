//! Cache-aware filter application
//!
//! [`FilterTool`] runs filter chains against hunks. Results are cached under
//! keys derived from the input content and the exact filter combination, so
//! an unchanged input with an unchanged chain skips the filters entirely,
//! whichever file the content came from.
//!
//! The cache key of a result is deliberately not the identity the result
//! exposes to later steps: a later step keys on the result's content. A source
//! change that does not alter a filter's output (whitespace before a minifier,
//! say) therefore leaves every downstream cache entry valid.

use crate::cache::{CacheKey, CacheStore, KeyBuilder};
use crate::config::Config;
use crate::content::{Content, ContentKind};
use crate::error::{MillError, MillResult};
use crate::filter::{
    Capability, FilterChain, FilterEntry, FilterOptions, ProducerArg, ProducerKind, TransformKind,
};
use crate::hunk::{Hunk, MemoryHunk};
use std::sync::Arc;

/// Low-level build diagnostics, emitted only when the tool's `debug_log`
/// flag is set
macro_rules! trace_step {
    ($tool:expr, $($arg:tt)+) => {
        if $tool.debug_log {
            tracing::debug!(target: "assetmill::debug", $($arg)+);
        }
    };
}

/// Applies filters to hunks, using the cache.
///
/// With `no_cache_read` set the cache is never consulted, though results are
/// still written to it.
pub struct FilterTool {
    cache: Option<Arc<dyn CacheStore>>,
    no_cache_read: bool,
    options: FilterOptions,
    debug_log: bool,
}

impl FilterTool {
    pub fn new(cache: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            cache,
            no_cache_read: false,
            options: FilterOptions::new(),
            debug_log: false,
        }
    }

    /// Build a tool with the cache and settings described by `config`
    pub fn from_config(config: &Config) -> MillResult<Self> {
        Ok(Self::new(config.cache.build_store()?)
            .no_cache_read(config.engine.no_cache_read)
            .with_options(config.engine.options.clone())
            .debug_log(config.engine.debug_log))
    }

    pub fn no_cache_read(mut self, no_cache_read: bool) -> Self {
        self.no_cache_read = no_cache_read;
        self
    }

    /// Default options passed to every filter call
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn debug_log(mut self, enabled: bool) -> Self {
        self.debug_log = enabled;
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.cache.as_ref()
    }

    fn merged_options(&self, options: Option<&FilterOptions>) -> FilterOptions {
        let mut merged = self.options.clone();
        if let Some(options) = options {
            merged.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Return the cached value for `key`, or run `compute` and store its
    /// output
    fn wrap_cache<D, C>(&self, key: &CacheKey, decode: D, compute: C) -> MillResult<MemoryHunk>
    where
        D: FnOnce(Vec<u8>) -> MillResult<Content>,
        C: FnOnce() -> MillResult<Content>,
    {
        if let Some(cache) = &self.cache {
            if !self.no_cache_read {
                trace_step!(self, "Checking cache for key {}", key);
                if let Some(bytes) = cache.get(key)? {
                    trace_step!(self, "Using cached result for {}", key);
                    return Ok(MemoryHunk::new(decode(bytes)?));
                }
            }
        }

        let content = compute()?;
        if let Some(cache) = &self.cache {
            trace_step!(self, "Storing result in cache with key {}", key);
            cache.set(key, content.as_bytes())?;
        }
        Ok(MemoryHunk::new(content))
    }

    /// Apply the `kind` method of every filter implementing it to `hunk`, in
    /// order, returning a new hunk.
    ///
    /// When no filter implements `kind` the input hunk itself is returned and
    /// the cache is not touched. `options` override the tool's defaults.
    pub fn apply(
        &self,
        hunk: Arc<dyn Hunk>,
        filters: &FilterChain,
        kind: TransformKind,
        options: Option<&FilterOptions>,
    ) -> MillResult<Arc<dyn Hunk>> {
        let capability = Capability::from(kind);
        trace_step!(
            self,
            "Need to run method \"{}\" of filters {:?} on hunk {:?} with options={:?}",
            capability,
            filters,
            hunk,
            options
        );

        let filters = filters.supporting(capability);
        if filters.is_empty() {
            trace_step!(
                self,
                "No filters have \"{}\" methods, returning hunk unchanged",
                capability
            );
            return Ok(hunk);
        }

        let content = hunk.data()?;
        let stream_kind = content.kind();
        let key = KeyBuilder::new("hunk")
            .fingerprint(&content.fingerprint())
            .list(filters.identities())
            .text(capability.as_str())
            .build();

        let result = self.wrap_cache(
            &key,
            |bytes| Content::from_kind(stream_kind, bytes),
            || {
                let options = self.merged_options(options);
                let mut data = content.into_bytes();
                for entry in &filters {
                    trace_step!(
                        self,
                        "Running method \"{}\" of {:?} with options={:?}",
                        capability,
                        entry,
                        options
                    );
                    data = self.run_transform(entry, kind, stream_kind, &data, &options)?;
                }
                Content::from_kind(stream_kind, data)
            },
        )?;

        Ok(Arc::new(result))
    }

    fn run_transform(
        &self,
        entry: &FilterEntry,
        kind: TransformKind,
        stream_kind: ContentKind,
        data: &[u8],
        options: &FilterOptions,
    ) -> MillResult<Vec<u8>> {
        let mut input = data;
        let mut out = Vec::new();
        match kind {
            TransformKind::Input => entry.filter().input(&mut input, &mut out, options)?,
            TransformKind::Output => entry.filter().output(&mut input, &mut out, options)?,
        }

        if stream_kind == ContentKind::Text && std::str::from_utf8(&out).is_err() {
            return Err(MillError::filter(
                entry.name(),
                "wrote non-UTF-8 output to a text stream",
            ));
        }
        Ok(out)
    }

    /// Run the single filter implementing producer method `kind` with
    /// `args`.
    ///
    /// Fails with [`MillError::NoApplicableFilters`] when no filter
    /// implements `kind` and with [`MillError::AmbiguousFilterCombination`]
    /// when more than one does. `extra_key` adds discriminators to the cache
    /// key beyond the arguments and the filter.
    pub fn apply_func(
        &self,
        filters: &FilterChain,
        kind: ProducerKind,
        args: &[ProducerArg],
        options: Option<&FilterOptions>,
        extra_key: &[String],
    ) -> MillResult<MemoryHunk> {
        let capability = Capability::from(kind);
        trace_step!(
            self,
            "Need to run method \"{}\" of one of the filters {:?} with args={:?}, options={:?}",
            capability,
            filters,
            args,
            options
        );

        let filters = filters.supporting(capability);
        let entry = match filters.len() {
            0 => {
                trace_step!(self, "No filters have a \"{}\" method", capability);
                return Err(MillError::NoApplicableFilters {
                    capability: capability.as_str(),
                });
            }
            1 => filters.iter().next().cloned().ok_or_else(|| {
                MillError::Internal("filter chain lost its only entry".to_string())
            })?,
            _ => {
                return Err(MillError::AmbiguousFilterCombination {
                    capability: capability.as_str(),
                    filters: filters.names(),
                })
            }
        };

        let mut builder = KeyBuilder::new("hunk");
        for arg in args {
            builder = match arg {
                ProducerArg::Text(text) => builder.text("text").text(text),
                ProducerArg::Path(path) => builder.text("path").text(&path.to_string_lossy()),
                ProducerArg::Hunk(hunk) => builder.text("hunk").fingerprint(&hunk.fingerprint()?),
            };
        }
        let key = builder
            .list([entry.identity()])
            .text(capability.as_str())
            .list(extra_key)
            .build();

        self.wrap_cache(
            &key,
            |bytes| Ok(Content::from_utf8_or_bytes(bytes)),
            || {
                let options = self.merged_options(options);
                trace_step!(
                    self,
                    "Running method \"{}\" of {:?} with args={:?}, options={:?}",
                    capability,
                    entry,
                    args,
                    options
                );
                let mut out = Vec::new();
                match kind {
                    ProducerKind::Open => entry.filter().open(&mut out, args, &options)?,
                    ProducerKind::Concat => entry.filter().concat(&mut out, args, &options)?,
                }
                Ok(Content::from_utf8_or_bytes(out))
            },
        )
    }
}
