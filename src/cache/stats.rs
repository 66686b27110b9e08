//! Cache Statistics Module
//!
//! Per-region counters for hits, misses, evictions, expirations and
//! overflow traffic.

use serde::Serialize;

// == Cache Stats ==
/// Tracks region performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful reads
    pub hits: u64,
    /// Number of reads that found nothing (absent, expired or unreadable)
    pub misses: u64,
    /// Number of entries removed from the primary store for capacity
    pub evictions: u64,
    /// Number of entries discarded because they expired
    pub expirations: u64,
    /// Number of evicted entries written to the overflow store
    pub passivations: u64,
    /// Number of entries moved back from the overflow store
    pub activations: u64,
    /// Number of evicted entries lost because the overflow write failed
    pub passivation_failures: u64,
    /// Current number of entries in the primary store
    pub total_entries: usize,
    /// Current number of entries in the overflow store
    pub overflow_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_passivation(&mut self) {
        self.passivations += 1;
    }

    pub fn record_activation(&mut self) {
        self.activations += 1;
    }

    pub fn record_passivation_failure(&mut self) {
        self.passivation_failures += 1;
    }

    // == Update Entry Counts ==
    pub fn set_entry_counts(&mut self, total_entries: usize, overflow_entries: usize) {
        self.total_entries = total_entries;
        self.overflow_entries = overflow_entries;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_overflow_counters() {
        let mut stats = CacheStats::new();
        stats.record_evictions(3);
        stats.record_passivation();
        stats.record_passivation();
        stats.record_passivation_failure();
        stats.record_activation();
        stats.record_expirations(2);

        assert_eq!(stats.evictions, 3);
        assert_eq!(stats.passivations, 2);
        assert_eq!(stats.passivation_failures, 1);
        assert_eq!(stats.activations, 1);
        assert_eq!(stats.expirations, 2);
    }

    #[test]
    fn test_set_entry_counts() {
        let mut stats = CacheStats::new();
        stats.set_entry_counts(42, 7);
        assert_eq!(stats.total_entries, 42);
        assert_eq!(stats.overflow_entries, 7);
    }
}
