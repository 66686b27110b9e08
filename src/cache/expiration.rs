//! Expiration Module
//!
//! Lifespan and max-idle rules evaluated against a region's clock.

use crate::cache::CacheEntry;
use crate::config::RegionConfig;

// == Expiration Policy ==
/// Expiration thresholds of a region. A threshold of 0 is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    pub lifespan_ms: u64,
    pub max_idle_ms: u64,
}

impl ExpirationPolicy {
    pub fn new(lifespan_ms: u64, max_idle_ms: u64) -> Self {
        Self {
            lifespan_ms,
            max_idle_ms,
        }
    }

    pub fn from_config(config: &RegionConfig) -> Self {
        Self::new(config.lifespan_ms(), config.max_idle_ms())
    }

    /// True when neither rule is enabled.
    pub fn is_disabled(&self) -> bool {
        self.lifespan_ms == 0 && self.max_idle_ms == 0
    }

    /// An entry expires once its age reaches the lifespan or its idle time
    /// reaches max idle.
    pub fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        self.lifespan_elapsed(entry.created_at, now)
            || (self.max_idle_ms > 0 && entry.idle_ms(now) >= self.max_idle_ms)
    }

    /// Lifespan rule alone, used for passivated entries whose idle clock
    /// restarts on activation.
    pub fn lifespan_elapsed(&self, created_at: u64, now: u64) -> bool {
        self.lifespan_ms > 0 && now.saturating_sub(created_at) >= self.lifespan_ms
    }
}
