//! Region Configuration
//!
//! Immutable per-region settings and the builder that validates them.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Defaults ==
/// Default maximum number of primary entries per region.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
/// Default entry lifespan in milliseconds.
pub const DEFAULT_LIFESPAN_MS: u64 = 100_000;
/// Default max idle time in milliseconds.
pub const DEFAULT_MAX_IDLE_MS: u64 = 100_000;
/// Default overflow store capacity.
pub const DEFAULT_OVERFLOW_MAX_ENTRIES: usize = 10_000;
/// Directory name created under the process temp directory for overflow logs.
pub const DEFAULT_OVERFLOW_DIR_NAME: &str = "region-cache";

/// Returns the default overflow location (`<tmp>/region-cache`).
pub fn default_overflow_location() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_OVERFLOW_DIR_NAME)
}

// == Cache Mode ==
/// Propagation topology a region is declared with.
///
/// Only descriptive: regions are always process-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Local,
    InvalidationAsync,
    ReplicatedAsync,
}

// == Eviction Type ==
/// How the capacity of a region is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionType {
    /// Capacity is a number of entries
    Count,
}

// == Locking ==
/// Lock settings carried with a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockingConfig {
    pub concurrency_level: usize,
    pub acquisition_timeout_ms: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            concurrency_level: 1000,
            acquisition_timeout_ms: 15_000,
        }
    }
}

// == Region Config ==
/// Validated configuration of a single region.
///
/// `lifespan_ms` and `max_idle_ms` use 0 to mean "disabled".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionConfig {
    max_entries: usize,
    eviction: EvictionType,
    lifespan_ms: u64,
    max_idle_ms: u64,
    passivation: bool,
    overflow_max_entries: usize,
    overflow_location: PathBuf,
    purge_on_startup: bool,
    cache_mode: CacheMode,
    locking: LockingConfig,
    statistics: bool,
}

impl RegionConfig {
    /// Starts a builder populated with the default region settings.
    pub fn builder() -> RegionConfigBuilder {
        RegionConfigBuilder::default()
    }

    /// Returns a builder seeded with this configuration.
    pub fn to_builder(&self) -> RegionConfigBuilder {
        RegionConfigBuilder {
            inner: self.clone(),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn eviction(&self) -> EvictionType {
        self.eviction
    }

    pub fn lifespan_ms(&self) -> u64 {
        self.lifespan_ms
    }

    pub fn max_idle_ms(&self) -> u64 {
        self.max_idle_ms
    }

    pub fn passivation(&self) -> bool {
        self.passivation
    }

    pub fn overflow_max_entries(&self) -> usize {
        self.overflow_max_entries
    }

    pub fn overflow_location(&self) -> &PathBuf {
        &self.overflow_location
    }

    pub fn purge_on_startup(&self) -> bool {
        self.purge_on_startup
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    pub fn locking(&self) -> LockingConfig {
        self.locking
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            eviction: EvictionType::Count,
            lifespan_ms: DEFAULT_LIFESPAN_MS,
            max_idle_ms: DEFAULT_MAX_IDLE_MS,
            passivation: true,
            overflow_max_entries: DEFAULT_OVERFLOW_MAX_ENTRIES,
            overflow_location: default_overflow_location(),
            purge_on_startup: true,
            cache_mode: CacheMode::Local,
            locking: LockingConfig::default(),
            statistics: true,
        }
    }
}

// == Builder ==
/// Fluent builder for [`RegionConfig`].
#[derive(Debug, Clone, Default)]
pub struct RegionConfigBuilder {
    inner: RegionConfig,
}

impl RegionConfigBuilder {
    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.inner.max_entries = max_entries;
        self
    }

    #[must_use]
    pub fn lifespan_ms(mut self, lifespan_ms: u64) -> Self {
        self.inner.lifespan_ms = lifespan_ms;
        self
    }

    #[must_use]
    pub fn max_idle_ms(mut self, max_idle_ms: u64) -> Self {
        self.inner.max_idle_ms = max_idle_ms;
        self
    }

    /// Disables both lifespan and idle expiration.
    #[must_use]
    pub fn no_expiration(self) -> Self {
        self.lifespan_ms(0).max_idle_ms(0)
    }

    #[must_use]
    pub fn passivation(mut self, enabled: bool) -> Self {
        self.inner.passivation = enabled;
        self
    }

    #[must_use]
    pub fn overflow_max_entries(mut self, max_entries: usize) -> Self {
        self.inner.overflow_max_entries = max_entries;
        self
    }

    #[must_use]
    pub fn overflow_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.inner.overflow_location = location.into();
        self
    }

    #[must_use]
    pub fn purge_on_startup(mut self, purge: bool) -> Self {
        self.inner.purge_on_startup = purge;
        self
    }

    #[must_use]
    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.inner.cache_mode = mode;
        self
    }

    #[must_use]
    pub fn locking(mut self, locking: LockingConfig) -> Self {
        self.inner.locking = locking;
        self
    }

    #[must_use]
    pub fn statistics(mut self, enabled: bool) -> Self {
        self.inner.statistics = enabled;
        self
    }

    /// Validates and freezes the configuration.
    ///
    /// `label` names the template or region in the error message.
    pub fn build(self, label: &str) -> Result<RegionConfig> {
        if self.inner.max_entries == 0 {
            return Err(CacheError::invalid_config(
                label,
                "max_entries must be greater than zero",
            ));
        }
        if self.inner.passivation && self.inner.overflow_max_entries == 0 {
            return Err(CacheError::invalid_config(
                label,
                "overflow_max_entries must be greater than zero when passivation is enabled",
            ));
        }
        if self.inner.passivation && self.inner.overflow_location.as_os_str().is_empty() {
            return Err(CacheError::invalid_config(
                label,
                "overflow_location must be set when passivation is enabled",
            ));
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_config_defaults() {
        let config = RegionConfig::default();
        assert_eq!(config.max_entries(), 10_000);
        assert_eq!(config.eviction(), EvictionType::Count);
        assert_eq!(config.lifespan_ms(), 100_000);
        assert_eq!(config.max_idle_ms(), 100_000);
        assert!(config.passivation());
        assert_eq!(config.overflow_max_entries(), 10_000);
        assert!(config.overflow_location().ends_with(DEFAULT_OVERFLOW_DIR_NAME));
        assert!(config.purge_on_startup());
        assert_eq!(config.locking(), LockingConfig::default());
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let result = RegionConfig::builder().max_entries(0).build("entity");
        match result {
            Err(CacheError::InvalidConfig { region, .. }) => assert_eq!(region, "entity"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_rejects_zero_overflow_with_passivation() {
        let result = RegionConfig::builder()
            .overflow_max_entries(0)
            .build("query");
        assert!(matches!(result, Err(CacheError::InvalidConfig { .. })));

        // Without passivation the overflow capacity is irrelevant
        let config = RegionConfig::builder()
            .passivation(false)
            .overflow_max_entries(0)
            .build("query")
            .unwrap();
        assert!(!config.passivation());
    }

    #[test]
    fn test_to_builder_derives_without_mutating_original() {
        let base = RegionConfig::default();
        let derived = base
            .to_builder()
            .max_idle_ms(60_000)
            .lifespan_ms(0)
            .build("pending-puts")
            .unwrap();

        assert_eq!(base.max_idle_ms(), DEFAULT_MAX_IDLE_MS);
        assert_eq!(derived.max_idle_ms(), 60_000);
        assert_eq!(derived.lifespan_ms(), 0);
        assert_eq!(derived.max_entries(), base.max_entries());
    }
}
