//! Configuration schema for assetmill
//!
//! Configuration is stored at `~/.config/assetmill/config.toml`

use crate::cache::{CacheStore, FileSystemCache, MemoryCache};
use crate::error::MillResult;
use crate::filter::FilterOptions;
use crate::hunk::UreqFetcher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter engine settings
    pub engine: EngineConfig,

    /// Result cache settings
    pub cache: CacheConfig,

    /// Remote resource settings
    pub remote: RemoteConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Filter engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Skip cache lookups (results are still written)
    pub no_cache_read: bool,

    /// Emit low-level build diagnostics
    pub debug_log: bool,

    /// Default options passed to every filter
    pub options: FilterOptions,
}

/// Cache backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map, lost on exit
    #[default]
    Memory,
    /// One file per entry in a directory
    Filesystem,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable result caching (default: true)
    pub enabled: bool,

    /// Where cached results live
    pub backend: CacheBackend,

    /// Directory for the filesystem backend (default: ~/.cache/assetmill)
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// Create the configured cache store, or `None` when caching is disabled
    pub fn build_store(&self) -> MillResult<Option<Arc<dyn CacheStore>>> {
        if !self.enabled {
            return Ok(None);
        }

        let store: Arc<dyn CacheStore> = match self.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Filesystem => {
                let dir = self
                    .directory
                    .clone()
                    .unwrap_or_else(FileSystemCache::default_directory);
                Arc::new(FileSystemCache::new(dir)?)
            }
        };
        Ok(Some(store))
    }
}

/// Remote resource settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User-Agent header sent with requests
    pub user_agent: String,

    /// Largest accepted response body in bytes (0 = unlimited)
    pub max_body_bytes: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("assetmill/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 0,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// HTTP fetcher honouring these settings
    pub fn fetcher(&self) -> UreqFetcher {
        let fetcher = UreqFetcher::new(self.timeout(), &self.user_agent);
        match self.max_body_bytes {
            0 => fetcher,
            limit => fetcher.with_body_limit(limit),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 = warn, 1 = info, 2+ = debug
    pub verbose: u8,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            log_format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(!config.engine.no_cache_read);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [engine]
            debug_log = true

            [engine.options]
            charset = "utf-8"
            line_length = 80

            [cache]
            backend = "filesystem"
            directory = "/tmp/assetmill"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.engine.debug_log);
        assert_eq!(config.engine.options["charset"], serde_json::json!("utf-8"));
        assert_eq!(config.engine.options["line_length"], serde_json::json!(80));
        assert_eq!(config.cache.backend, CacheBackend::Filesystem);
        assert_eq!(config.remote.timeout_secs, 30); // default preserved
    }

    #[test]
    fn disabled_cache_builds_nothing() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        assert!(config.build_store().unwrap().is_none());
    }

    #[test]
    fn filesystem_cache_uses_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cache");
        let config = CacheConfig {
            enabled: true,
            backend: CacheBackend::Filesystem,
            directory: Some(dir.clone()),
        };
        assert!(config.build_store().unwrap().is_some());
        assert!(dir.is_dir());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let remote = RemoteConfig {
            timeout_secs: 0,
            ..RemoteConfig::default()
        };
        assert!(remote.timeout().is_none());
        assert_eq!(
            RemoteConfig::default().timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn body_limit_defaults_to_unlimited() {
        assert_eq!(RemoteConfig::default().fetcher().body_limit(), u64::MAX);

        let config: Config = toml::from_str("[remote]\nmax_body_bytes = 1024\n").unwrap();
        assert_eq!(config.remote.fetcher().body_limit(), 1024);
    }
}
