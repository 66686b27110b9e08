//! Cache Entry Module
//!
//! Defines the structure for individual region entries and their timestamps.

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (milliseconds)
    pub created_at: u64,
    /// Last read or write (milliseconds)
    pub last_accessed: u64,
    /// Approximate size cost in bytes
    pub size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped at `now`.
    pub fn new(value: Value, now: u64) -> Self {
        let size = approximate_size(&value);
        Self {
            value,
            created_at: now,
            last_accessed: now,
            size,
        }
    }

    /// Rebuilds an entry brought back from overflow.
    ///
    /// The original creation time is kept so lifespan keeps counting.
    pub fn restore(value: Value, created_at: u64, now: u64) -> Self {
        let size = approximate_size(&value);
        Self {
            value,
            created_at,
            last_accessed: now,
            size,
        }
    }

    // == Touch ==
    /// Refreshes the last-access time.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed = now;
    }

    /// Milliseconds since creation.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Milliseconds since the last access.
    pub fn idle_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_accessed)
    }
}

// == Utility Functions ==
/// Serialized JSON length of a value.
pub fn approximate_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(0)
}
