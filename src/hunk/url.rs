//! Hunks referencing a remote resource
//!
//! The body is fetched lazily on first access and memoised. When a cache
//! store is available, the `ETag`/`Last-Modified` validators of the last
//! response are kept in it and sent as a conditional request next time; a
//! `304 Not Modified` answer reuses the cached body.

use crate::cache::{CacheKey, CacheStore};
use crate::content::Content;
use crate::error::{MillError, MillResult};
use crate::hunk::Hunk;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Validators of a previous response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Validators {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Outcome of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// The server confirmed the validators are still current
    NotModified,
    /// A full body
    Fetched { body: Vec<u8>, validators: Validators },
}

/// Transport used to retrieve remote resources.
///
/// Timeouts and retries are the implementation's business; any failure other
/// than "not modified" must be returned as an error.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, validators: Option<&Validators>) -> MillResult<FetchResponse>;
}

/// HTTP fetcher backed by `ureq`
pub struct UreqFetcher {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqFetcher {
    /// Create a fetcher that accepts response bodies of any size
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .user_agent(user_agent)
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            body_limit: u64::MAX,
        }
    }

    /// Reject response bodies larger than `limit` bytes
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new(
            Some(Duration::from_secs(30)),
            concat!("assetmill/", env!("CARGO_PKG_VERSION")),
        )
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str, validators: Option<&Validators>) -> MillResult<FetchResponse> {
        let mut request = self.agent.get(url);
        if let Some(validators) = validators {
            if let Some(etag) = &validators.etag {
                request = request.header("If-None-Match", etag.as_str());
            }
            if let Some(lmod) = &validators.last_modified {
                request = request.header("If-Modified-Since", lmod.as_str());
            }
        }

        // The response owns the connection and releases it when dropped
        let mut response = request.call().map_err(|e| MillError::transport(url, e))?;

        let status = response.status();
        if status == ureq::http::StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotModified);
        }
        if !status.is_success() {
            return Err(MillError::transport(url, format!("HTTP {}", status)));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let validators = Validators {
            etag: header("etag"),
            last_modified: header("last-modified"),
        };

        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(|e| MillError::transport(url, e))?;

        Ok(FetchResponse::Fetched { body, validators })
    }
}

/// A file referenced by URL
pub struct UrlHunk {
    url: String,
    cache: Option<Arc<dyn CacheStore>>,
    fetcher: Arc<dyn Fetcher>,
    data: OnceLock<Content>,
    fetching: Mutex<()>,
}

impl UrlHunk {
    /// Create a hunk for `url`. Without a cache every fetch is unconditional.
    pub fn new(
        url: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Self {
        Self {
            url: url.into(),
            cache,
            fetcher,
            data: OnceLock::new(),
            fetching: Mutex::new(()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn stored_validators(&self, cache: &dyn CacheStore) -> MillResult<Option<Validators>> {
        let Some(raw) = cache.get(&CacheKey::url_headers(&self.url))? else {
            return Ok(None);
        };
        let validators: Validators = serde_json::from_slice(&raw)?;
        Ok((!validators.is_empty()).then_some(validators))
    }

    fn store(&self, body: Vec<u8>, validators: &Validators) -> MillResult<Content> {
        if let Some(cache) = &self.cache {
            cache.set(
                &CacheKey::url_headers(&self.url),
                &serde_json::to_vec(validators)?,
            )?;
            cache.set(&CacheKey::url_contents(&self.url), &body)?;
        }
        Ok(Content::from_utf8_or_bytes(body))
    }

    fn fetch(&self) -> MillResult<Content> {
        let validators = match &self.cache {
            Some(cache) => self.stored_validators(cache.as_ref())?,
            None => None,
        };

        debug!(
            "Fetching {} (conditional: {})",
            self.url,
            validators.is_some()
        );

        match self.fetcher.fetch(&self.url, validators.as_ref())? {
            FetchResponse::Fetched { body, validators } => self.store(body, &validators),
            FetchResponse::NotModified => {
                if let Some(cache) = &self.cache {
                    if let Some(body) = cache.get(&CacheKey::url_contents(&self.url))? {
                        debug!("{} not modified, using cached body", self.url);
                        return Ok(Content::from_utf8_or_bytes(body));
                    }
                }

                warn!("{} not modified but no cached body, refetching", self.url);
                match self.fetcher.fetch(&self.url, None)? {
                    FetchResponse::Fetched { body, validators } => self.store(body, &validators),
                    FetchResponse::NotModified => Err(MillError::transport(
                        &self.url,
                        "304 Not Modified for an unconditional request",
                    )),
                }
            }
        }
    }
}

impl Hunk for UrlHunk {
    fn data(&self) -> MillResult<Content> {
        if let Some(content) = self.data.get() {
            return Ok(content.clone());
        }

        let _guard = self
            .fetching
            .lock()
            .map_err(|_| MillError::Internal("url hunk fetch lock poisoned".to_string()))?;
        if let Some(content) = self.data.get() {
            return Ok(content.clone());
        }

        let content = self.fetch()?;
        Ok(self.data.get_or_init(|| content).clone())
    }

    fn provenance(&self) -> Vec<String> {
        vec![self.url.clone()]
    }
}

impl fmt::Debug for UrlHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<UrlHunk {}>", self.url)
    }
}
