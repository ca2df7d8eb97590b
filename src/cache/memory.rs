//! In-process cache store

use crate::cache::{CacheKey, CacheStore};
use crate::error::{MillError, MillResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache store holding entries in memory for the life of the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> MillResult<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MillError::Internal("memory cache lock poisoned".to_string()))?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn set(&self, key: &CacheKey, value: &[u8]) -> MillResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| MillError::Internal("memory cache lock poisoned".to_string()))?;
        entries.insert(key.as_str().to_string(), value.to_vec());
        Ok(())
    }
}
