//! Region Module
//!
//! A named cache namespace: primary store, LRU eviction, expiration and an
//! optional overflow store, all guarded by one lock per region.

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::store::Evicted;
use crate::cache::{
    approximate_size, CacheEntry, CacheStats, EntryStore, ExpirationPolicy, OverflowStore,
    SharedClock, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::config::RegionConfig;
use crate::error::{CacheError, Result};

// == Put Outcome ==
/// What happened to the entries a `put` pushed out of the primary store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOutcome {
    /// Entries evicted for capacity
    pub evicted: usize,
    /// Evicted entries written to the overflow store
    pub passivated: usize,
    /// Evicted entries lost because the overflow write failed
    pub lost: usize,
}

// == Region ==
/// A single cache region.
///
/// Every operation takes the region lock for its whole duration, overflow
/// I/O included, so readers never see an entry between tiers.
#[derive(Debug)]
pub struct Region {
    name: String,
    config: RegionConfig,
    policy: ExpirationPolicy,
    clock: SharedClock,
    state: Mutex<RegionState>,
}

#[derive(Debug)]
struct RegionState {
    store: EntryStore,
    overflow: Option<OverflowStore>,
    stats: CacheStats,
    closed: bool,
}

impl Region {
    // == Constructor ==
    /// Creates a region, opening its overflow store when passivation is on.
    pub async fn open(name: impl Into<String>, config: RegionConfig, clock: SharedClock) -> Result<Self> {
        let name = name.into();

        let overflow = if config.passivation() {
            let store = OverflowStore::open(
                config.overflow_location(),
                &name,
                config.overflow_max_entries(),
                config.purge_on_startup(),
            )
            .await
            .map_err(|source| CacheError::OverflowWrite {
                region: name.clone(),
                source,
            })?;
            Some(store)
        } else {
            None
        };

        let mut stats = CacheStats::new();
        stats.set_entry_counts(0, overflow.as_ref().map_or(0, OverflowStore::len));

        info!(
            region = %name,
            max_entries = config.max_entries(),
            lifespan_ms = config.lifespan_ms(),
            max_idle_ms = config.max_idle_ms(),
            passivation = config.passivation(),
            "Region created"
        );

        Ok(Self {
            policy: ExpirationPolicy::from_config(&config),
            state: Mutex::new(RegionState {
                store: EntryStore::new(config.max_entries()),
                overflow,
                stats,
                closed: false,
            }),
            name,
            config,
            clock,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    // == Get ==
    /// Returns the value for `key`, or `None` on a miss.
    ///
    /// Expired entries are removed and read as a miss. A key found only in
    /// the overflow store is activated back into the primary store.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let now = self.clock.now_ms();

        let expired = state
            .store
            .peek(key)
            .map(|entry| self.policy.is_expired(entry, now));

        let value = match expired {
            Some(true) => {
                state.store.remove(key);
                state.record(self.config.statistics(), |s| s.record_expirations(1));
                None
            }
            Some(false) => state.store.access(key, now),
            None => self.activate(&mut state, key, now).await,
        };

        let statistics = self.config.statistics();
        if value.is_some() {
            state.record(statistics, CacheStats::record_hit);
        } else {
            state.record(statistics, CacheStats::record_miss);
        }
        state.refresh_counts();
        Ok(value)
    }

    async fn activate(&self, state: &mut RegionState, key: &str, now: u64) -> Option<Value> {
        let overflow = state.overflow.as_mut()?;
        let passivated = match overflow.load(key).await {
            Ok(found) => found?,
            Err(e) => {
                let err = CacheError::OverflowRead {
                    region: self.name.clone(),
                    source: e,
                };
                warn!(region = %self.name, key, error = %err, "Treating unreadable overflow entry as a miss");
                return None;
            }
        };

        if self.policy.lifespan_elapsed(passivated.created_at, now) {
            debug!(region = %self.name, key, "Passivated entry outlived its lifespan");
            state.record(self.config.statistics(), |s| s.record_expirations(1));
            return None;
        }

        let value = passivated.value.clone();
        let entry = CacheEntry::restore(passivated.value, passivated.created_at, now);
        let evicted = state.store.insert(key.to_string(), entry);
        state.record(self.config.statistics(), CacheStats::record_activation);
        debug!(region = %self.name, key, "Activated entry from overflow");

        self.evict(state, evicted, now).await;
        Some(value)
    }

    // == Put ==
    /// Inserts or replaces an entry.
    ///
    /// When the region is over capacity afterwards, least recently used
    /// entries are evicted before this returns. Passivation failures are
    /// logged and counted in the outcome but never fail the put.
    pub async fn put(&self, key: impl Into<String>, value: Value) -> Result<PutOutcome> {
        let key = key.into();
        validate_key(&key)?;
        let size = approximate_size(&value);
        if size > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let now = self.clock.now_ms();

        // An entry lives in exactly one tier
        if let Some(overflow) = state.overflow.as_mut() {
            if let Err(e) = overflow.remove(&key).await {
                warn!(region = %self.name, key = %key, error = %e, "Failed to drop stale overflow copy");
            }
        }

        let evicted = state.store.insert(key, CacheEntry::new(value, now));
        let outcome = self.evict(&mut state, evicted, now).await;
        state.refresh_counts();
        Ok(outcome)
    }

    /// Hands capacity-evicted entries to the overflow store, or drops them.
    async fn evict(&self, state: &mut RegionState, evicted: Vec<Evicted>, now: u64) -> PutOutcome {
        let mut outcome = PutOutcome {
            evicted: evicted.len(),
            ..PutOutcome::default()
        };
        if evicted.is_empty() {
            return outcome;
        }

        let statistics = self.config.statistics();
        state.record(statistics, |s| s.record_evictions(evicted.len()));

        for (key, entry) in evicted {
            debug!(region = %self.name, key = %key, "Evicted entry");
            if self.policy.is_expired(&entry, now) {
                state.record(statistics, |s| s.record_expirations(1));
                continue;
            }
            let Some(overflow) = state.overflow.as_mut() else {
                continue;
            };

            match overflow.store(&key, &entry.value, entry.created_at).await {
                Ok(()) => {
                    outcome.passivated += 1;
                    state.record(statistics, CacheStats::record_passivation);
                }
                Err(e) => {
                    let err = CacheError::OverflowWrite {
                        region: self.name.clone(),
                        source: e,
                    };
                    error!(region = %self.name, key = %key, error = %err, "Passivation failed, entry lost");
                    outcome.lost += 1;
                    state.record(statistics, CacheStats::record_passivation_failure);
                }
            }
        }
        outcome
    }

    // == Remove ==
    /// Deletes `key` from both tiers. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;

        let mut removed = state.store.remove(key).is_some();
        if let Some(overflow) = state.overflow.as_mut() {
            removed |= overflow
                .remove(key)
                .await
                .map_err(|source| CacheError::OverflowWrite {
                    region: self.name.clone(),
                    source,
                })?;
        }
        state.refresh_counts();
        Ok(removed)
    }

    /// True when `key` holds a live primary entry, or a passivated one whose
    /// lifespan has not elapsed.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        let state = self.state.lock().await;
        state.ensure_open()?;
        let now = self.clock.now_ms();

        let in_primary = state
            .store
            .peek(key)
            .is_some_and(|entry| !self.policy.is_expired(entry, now));
        let in_overflow = state
            .overflow
            .as_ref()
            .and_then(|overflow| overflow.created_at(key))
            .is_some_and(|created_at| !self.policy.lifespan_elapsed(created_at, now));
        Ok(in_primary || in_overflow)
    }

    // == Size ==
    /// Number of entries in the primary store.
    pub async fn size(&self) -> Result<usize> {
        let state = self.state.lock().await;
        state.ensure_open()?;
        Ok(state.store.len())
    }

    // == Clear ==
    /// Drops every entry from both tiers.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;

        state.store.clear();
        if let Some(overflow) = state.overflow.as_mut() {
            overflow
                .clear()
                .await
                .map_err(|source| CacheError::OverflowWrite {
                    region: self.name.clone(),
                    source,
                })?;
        }
        state.refresh_counts();
        info!(region = %self.name, "Region cleared");
        Ok(())
    }

    // == Sweep Expired ==
    /// Removes expired primary entries. Returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;

        let removed = state.store.remove_expired(&self.policy, self.clock.now_ms());
        if removed > 0 {
            state.record(self.config.statistics(), |s| s.record_expirations(removed));
            state.refresh_counts();
        }
        Ok(removed)
    }

    // == Stats ==
    /// Returns a snapshot of the region statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        state.stats.clone()
    }

    // == Shutdown ==
    /// Flushes live primary entries to the overflow store, then closes the
    /// region. Returns the number of entries flushed.
    pub async fn shutdown(&self) -> usize {
        let mut state = self.state.lock().await;
        if state.closed {
            return 0;
        }

        let now = self.clock.now_ms();
        let drained = state.store.drain();
        let mut flushed = 0;

        if let Some(mut overflow) = state.overflow.take() {
            for (key, entry) in drained {
                if self.policy.is_expired(&entry, now) {
                    continue;
                }
                match overflow.store(&key, &entry.value, entry.created_at).await {
                    Ok(()) => flushed += 1,
                    Err(e) => {
                        error!(region = %self.name, key = %key, error = %e, "Failed to flush entry on shutdown");
                    }
                }
            }
        }

        state.closed = true;
        state.refresh_counts();
        info!(region = %self.name, flushed, "Region shut down");
        flushed
    }
}

impl RegionState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CacheError::ManagerClosed)
        } else {
            Ok(())
        }
    }

    fn record<F: FnOnce(&mut CacheStats)>(&mut self, enabled: bool, update: F) {
        if enabled {
            update(&mut self.stats);
        }
    }

    fn refresh_counts(&mut self) {
        let overflow = self.overflow.as_ref().map_or(0, OverflowStore::len);
        self.stats.set_entry_counts(self.store.len(), overflow);
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
