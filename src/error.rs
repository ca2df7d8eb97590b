//! Error types for assetmill
//!
//! All modules use `MillResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for assetmill operations
pub type MillResult<T> = Result<T, MillError>;

/// All errors that can occur while merging hunks and applying filters
#[derive(Error, Debug)]
pub enum MillError {
    // Filter composition errors
    #[error("No filters implement the `{capability}` method")]
    NoApplicableFilters { capability: &'static str },

    #[error("These filters cannot be combined: {}", .filters.join(", "))]
    AmbiguousFilterCombination {
        capability: &'static str,
        filters: Vec<String>,
    },

    #[error("Filter {filter} does not implement `{capability}`")]
    UnsupportedCapability {
        filter: String,
        capability: &'static str,
    },

    #[error("Filter {name} failed: {reason}")]
    Filter { name: String, reason: String },

    // Source access errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Content is not valid UTF-8: {context}")]
    Decode { context: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MillError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a filter failure error
    pub fn filter(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Filter {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a transport error for a remote resource
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error comes from a misconfigured filter chain rather
    /// than from reading a source
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoApplicableFilters { .. }
                | Self::AmbiguousFilterCombination { .. }
                | Self::UnsupportedCapability { .. }
                | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoApplicableFilters { .. } => {
                Some("Add a filter providing this method to the bundle's filter list")
            }
            Self::AmbiguousFilterCombination { .. } => {
                Some("Only one filter per bundle may provide `open` or `concat`")
            }
            Self::Decode { .. } => Some("Wrap binary sources with MemoryHunk::from_bytes"),
            _ => None,
        }
    }
}
