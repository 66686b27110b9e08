//! Configuration Module
//!
//! Loads process configuration from environment variables and turns it into
//! the region templates the manager starts with.

mod manager;
mod region;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub use manager::{
    second_level_cache_templates, Configurer, ManagerConfig, ManagerConfigBuilder,
    DEFAULT_CLUSTER_NAME, ENTITY_TEMPLATE, PENDING_PUTS_MAX_IDLE_MS, PENDING_PUTS_TEMPLATE,
    QUERY_TEMPLATE, REPLICATED_QUERY_TEMPLATE, TIMESTAMPS_TEMPLATE,
};
pub use region::{
    default_overflow_location, CacheMode, EvictionType, LockingConfig, RegionConfig,
    RegionConfigBuilder, DEFAULT_LIFESPAN_MS, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_IDLE_MS,
    DEFAULT_OVERFLOW_MAX_ENTRIES,
};

use crate::error::Result;

/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expiration sweep interval in seconds
    pub sweep_interval: u64,
    /// Maximum primary entries per region
    pub max_entries: usize,
    /// Entry lifespan in milliseconds (0 = disabled)
    pub lifespan_ms: u64,
    /// Entry max idle in milliseconds (0 = disabled)
    pub max_idle_ms: u64,
    /// Whether evicted entries are passivated to disk
    pub passivation: bool,
    /// Maximum entries per region overflow store
    pub overflow_max_entries: usize,
    /// Directory holding overflow logs
    pub overflow_dir: PathBuf,
    /// Whether overflow logs are cleared when a region opens
    pub purge_on_startup: bool,
    /// Cluster name reported by the manager
    pub cluster_name: String,
    /// Whether per-region statistics are collected
    pub statistics: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiration sweep frequency in seconds (default: 1)
    /// - `CACHE_MAX_ENTRIES` - Maximum entries per region (default: 10000)
    /// - `CACHE_LIFESPAN_MS` - Entry lifespan in ms (default: 100000)
    /// - `CACHE_MAX_IDLE_MS` - Entry max idle in ms (default: 100000)
    /// - `CACHE_PASSIVATION` - Passivate evicted entries (default: true)
    /// - `CACHE_OVERFLOW_MAX_ENTRIES` - Overflow capacity (default: 10000)
    /// - `CACHE_OVERFLOW_DIR` - Overflow directory (default: `<tmp>/region-cache`)
    /// - `CACHE_PURGE_ON_STARTUP` - Clear overflow logs on open (default: true)
    /// - `CACHE_CLUSTER_NAME` - Cluster name (default: region-cache-cluster)
    /// - `CACHE_STATISTICS` - Collect statistics (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            lifespan_ms: env_or("CACHE_LIFESPAN_MS", defaults.lifespan_ms),
            max_idle_ms: env_or("CACHE_MAX_IDLE_MS", defaults.max_idle_ms),
            passivation: env_or("CACHE_PASSIVATION", defaults.passivation),
            overflow_max_entries: env_or(
                "CACHE_OVERFLOW_MAX_ENTRIES",
                defaults.overflow_max_entries,
            ),
            overflow_dir: env::var_os("CACHE_OVERFLOW_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.overflow_dir),
            purge_on_startup: env_or("CACHE_PURGE_ON_STARTUP", defaults.purge_on_startup),
            cluster_name: env::var("CACHE_CLUSTER_NAME").unwrap_or(defaults.cluster_name),
            statistics: env_or("CACHE_STATISTICS", defaults.statistics),
        }
    }

    /// Default region settings described by this configuration.
    pub fn default_region(&self) -> RegionConfigBuilder {
        RegionConfig::builder()
            .max_entries(self.max_entries)
            .lifespan_ms(self.lifespan_ms)
            .max_idle_ms(self.max_idle_ms)
            .passivation(self.passivation)
            .overflow_max_entries(self.overflow_max_entries)
            .overflow_location(self.overflow_dir.clone())
            .purge_on_startup(self.purge_on_startup)
            .statistics(self.statistics)
    }

    /// Builds the manager configuration: default region, then the stock
    /// second-level cache templates, then any extra configurers in order.
    pub fn manager_config<I>(&self, configurers: I) -> Result<ManagerConfig>
    where
        I: IntoIterator<Item = Configurer>,
    {
        ManagerConfig::builder()
            .default_region(self.default_region())
            .cluster_name(self.cluster_name.clone())
            .apply(second_level_cache_templates)
            .apply_all(configurers)
            .build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            sweep_interval: 1,
            max_entries: DEFAULT_MAX_ENTRIES,
            lifespan_ms: DEFAULT_LIFESPAN_MS,
            max_idle_ms: DEFAULT_MAX_IDLE_MS,
            passivation: true,
            overflow_max_entries: DEFAULT_OVERFLOW_MAX_ENTRIES,
            overflow_dir: default_overflow_location(),
            purge_on_startup: true,
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            statistics: true,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
