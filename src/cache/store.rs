//! Entry Store Module
//!
//! Bounded in-memory map combining HashMap storage with LRU tracking.
//! Expiration and overflow are decided by the owning region.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, ExpirationPolicy, LruTracker};

/// An entry removed from the store, with its key.
pub type Evicted = (String, CacheEntry);

// == Entry Store ==
/// Primary storage of a region.
#[derive(Debug)]
pub struct EntryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
        }
    }

    // == Insert ==
    /// Inserts or replaces an entry and marks it most recently used.
    ///
    /// Returns the entries evicted to get back within capacity, least
    /// recently used first. The inserted key is never among them.
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Vec<Evicted> {
        self.lru.touch(&key);
        self.entries.insert(key, entry);

        let mut evicted = Vec::new();
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                evicted.push((oldest, entry));
            }
        }
        evicted
    }

    /// Returns the entry without refreshing it.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Access ==
    /// Returns a copy of the value, refreshing last-access time and LRU position.
    pub fn access(&mut self, key: &str, now: u64) -> Option<Value> {
        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        self.lru.touch(key);
        Some(entry.value.clone())
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        Some(entry)
    }

    // == Remove Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub fn remove_expired(&mut self, policy: &ExpirationPolicy, now: u64) -> usize {
        if policy.is_disabled() {
            return 0;
        }

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| policy.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired_keys.len()
    }

    // == Drain ==
    /// Empties the store, returning entries least recently used first.
    pub fn drain(&mut self) -> Vec<Evicted> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(key) = self.lru.evict_oldest() {
            if let Some(entry) = self.entries.remove(&key) {
                drained.push((key, entry));
            }
        }
        self.entries.clear();
        drained
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }
}
