//! Composite cache keys

use crate::content::Fingerprint;
use sha2::{Digest, Sha256};
use std::fmt;

/// A cache key: SHA-256 over length-prefixed components.
///
/// Two keys are equal iff every component fed to the [`KeyBuilder`] was equal
/// and in the same position. The human-readable description is only for logs
/// and does not take part in equality.
#[derive(Debug, Clone)]
pub struct CacheKey {
    id: String,
    description: String,
}

impl CacheKey {
    /// Key under which a remote resource's validators are stored
    pub fn url_headers(url: &str) -> Self {
        KeyBuilder::new("url-headers").text(url).build()
    }

    /// Key under which a remote resource's body is stored
    pub fn url_contents(url: &str) -> Self {
        KeyBuilder::new("url-contents").text(url).build()
    }

    /// Hex digest, safe to use as a file name
    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CacheKey {}

impl std::hash::Hash for CacheKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, &self.id[..12])
    }
}

/// Incrementally builds a [`CacheKey`].
///
/// Every component is written with a type tag and a length prefix, so
/// `["ab", "c"]` and `["a", "bc"]` produce different keys.
pub struct KeyBuilder {
    hasher: Sha256,
    parts: Vec<String>,
}

impl KeyBuilder {
    pub fn new(namespace: &str) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
            parts: Vec::new(),
        };
        builder.write(b'n', namespace.as_bytes());
        builder.parts.push(namespace.to_string());
        builder
    }

    fn write(&mut self, tag: u8, data: &[u8]) {
        self.hasher.update([tag]);
        self.hasher.update((data.len() as u64).to_le_bytes());
        self.hasher.update(data);
    }

    pub fn text(mut self, value: &str) -> Self {
        self.write(b's', value.as_bytes());
        self.parts.push(value.to_string());
        self
    }

    pub fn fingerprint(mut self, fingerprint: &Fingerprint) -> Self {
        self.write(b'f', fingerprint.as_bytes());
        self.parts.push(fingerprint.short());
        self
    }

    /// An ordered tuple of strings, written as one component
    pub fn list<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
        self.write(b'l', &(items.len() as u64).to_le_bytes());
        for item in &items {
            self.write(b's', item.as_bytes());
        }
        self.parts.push(format!("[{}]", items.join(", ")));
        self
    }

    pub fn build(self) -> CacheKey {
        CacheKey {
            id: hex::encode(self.hasher.finalize()),
            description: self.parts.join(" "),
        }
    }
}
