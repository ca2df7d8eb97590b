//! Configuration management for assetmill

pub mod schema;

pub use schema::{CacheBackend, CacheConfig, Config, EngineConfig, LoggingConfig, RemoteConfig};

use crate::error::{MillError, MillResult};
use crate::tool::FilterTool;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const LOG_FORMATS: &[&str] = &["text", "json"];

/// Loads and saves the engine configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default location
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/assetmill/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assetmill")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> MillResult<Config> {
        match fs::read_to_string(&self.config_path).await {
            Ok(content) => self.parse(&self.config_path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                Ok(Config::default())
            }
            Err(e) => Err(MillError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )),
        }
    }

    /// Load configuration from a specific file, which must exist
    pub async fn load_from_file(&self, path: &Path) -> MillResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| MillError::io(format!("reading config from {}", path.display()), e))?;
        self.parse(path, &content)
    }

    /// Load the configuration and build a filter tool from it
    pub async fn load_tool(&self) -> MillResult<FilterTool> {
        FilterTool::from_config(&self.load().await?)
    }

    /// Parse, validate, and anchor relative cache directories at the file's
    /// own directory
    fn parse(&self, path: &Path, content: &str) -> MillResult<Config> {
        let invalid = |reason: String| MillError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let mut config: Config = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;

        if !LOG_FORMATS.contains(&config.logging.log_format.as_str()) {
            return Err(invalid(format!(
                "logging.log_format must be one of {}, got \"{}\"",
                LOG_FORMATS.join(", "),
                config.logging.log_format
            )));
        }

        if let (Some(dir), Some(base)) = (&config.cache.directory, path.parent()) {
            if dir.is_relative() {
                config.cache.directory = Some(base.join(dir));
            }
        }

        Ok(config)
    }

    pub async fn save(&self, config: &Config) -> MillResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MillError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            MillError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.logging.log_format, "text");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.engine.no_cache_read = true;
        config.cache.backend = CacheBackend::Filesystem;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert!(loaded.engine.no_cache_read);
        assert_eq!(loaded.cache.backend, CacheBackend::Filesystem);
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[cache]\nenabled = \"maybe\"\n")
            .await
            .unwrap();

        let err = ConfigManager::with_path(path.clone())
            .load()
            .await
            .unwrap_err();
        match err {
            MillError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn relative_cache_directory_follows_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[cache]\nbackend = \"filesystem\"\ndirectory = \"build-cache\"\n")
            .await
            .unwrap();

        let config = ConfigManager::with_path(path).load().await.unwrap();
        assert_eq!(
            config.cache.directory,
            Some(temp.path().join("build-cache"))
        );
    }

    #[tokio::test]
    async fn unknown_log_format_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[logging]\nlog_format = \"xml\"\n")
            .await
            .unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, MillError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("xml"));
    }

    #[tokio::test]
    async fn load_tool_uses_configured_cache() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));
        let mut config = Config::default();
        config.cache.enabled = false;
        manager.save(&config).await.unwrap();

        assert!(manager.load_tool().await.unwrap().cache().is_none());
        assert!(ConfigManager::with_path(temp.path().join("absent.toml"))
            .load_tool()
            .await
            .unwrap()
            .cache()
            .is_some());
    }
}
