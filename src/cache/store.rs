//! Process Cache Module
//!
//! String-keyed store of arbitrary JSON values that only exists once the
//! lifecycle has created it. No eviction, no expiry, no size bound.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{tags, CacheEntry, CacheStats};
use crate::error::{CoreError, Result};

// == Process Cache ==
/// The process-wide cache, owned by the composing context.
#[derive(Debug, Default)]
pub struct ProcessCache {
    /// Key-value storage, `None` until created
    entries: Option<HashMap<String, Value>>,
    /// Lookup statistics
    stats: CacheStats,
}

impl ProcessCache {
    // == Constructor ==
    /// Creates a handle with no backing map. Every access fails until
    /// [`ProcessCache::create`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    // == Create ==
    /// Installs a fresh empty map, replacing any previous one.
    pub fn create(&mut self) {
        self.entries = Some(HashMap::new());
        self.stats.set_total_entries(0);
    }

    /// Returns true once the backing map exists.
    pub fn is_created(&self) -> bool {
        self.entries.is_some()
    }

    fn entries_mut(&mut self) -> Result<&mut HashMap<String, Value>> {
        self.entries.as_mut().ok_or(CoreError::NotInitialized)
    }

    // == Remember ==
    /// Stores `value` under the tag-composed key, overwriting.
    ///
    /// Appends the marker tag to `tags` in place, so the caller sees
    /// `["a"]` become `["a", "used"]`. When the cache does not exist yet the
    /// call fails before the list is touched.
    pub fn remember(&mut self, key: &str, value: Value, tags: &mut Vec<String>) -> Result<()> {
        self.entries_mut()?;
        let derived = tags::compose(key, tags);
        self.insert(derived, value)
    }

    /// [`ProcessCache::remember`] with an empty tag list.
    pub fn remember_untagged(&mut self, key: &str, value: Value) -> Result<()> {
        let mut tags = Vec::new();
        self.remember(key, value, &mut tags)
    }

    /// Same key derivation as [`ProcessCache::remember`], leaving the
    /// caller's list alone. Returns the tag list the key was built from.
    pub fn remember_pure(&mut self, key: &str, value: Value, tags: &[String]) -> Result<Vec<String>> {
        self.entries_mut()?;
        let (derived, used) = tags::compose_pure(key, tags);
        self.insert(derived, value)?;
        Ok(used)
    }

    /// Stores `value` at exactly `key`.
    pub fn insert(&mut self, key: String, value: Value) -> Result<()> {
        let entries = self.entries_mut()?;
        debug!(key = %key, "cache write");
        entries.insert(key, value);
        let len = entries.len();
        self.stats.set_total_entries(len);
        Ok(())
    }

    // == Read ==
    /// Returns the value stored at `key` exactly as given, without deriving
    /// a tagged key and without checking its shape.
    pub fn read(&mut self, key: &str) -> Result<Option<CacheEntry>> {
        let found = self
            .entries
            .as_ref()
            .ok_or(CoreError::NotInitialized)?
            .get(key)
            .cloned();

        match found {
            Some(value) => {
                self.stats.record_hit();
                Ok(Some(CacheEntry::new(value)))
            }
            None => {
                self.stats.record_miss();
                debug!(key = %key, "cache miss");
                Ok(None)
            }
        }
    }

    // == Stats ==
    /// Returns current lookup statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Length ==
    /// Returns the number of stored entries, 0 when the cache is absent.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
