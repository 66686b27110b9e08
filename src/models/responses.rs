//! Response DTOs for the region cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, PutOutcome};

/// Response body for reading an entry (GET /regions/:region/entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub region: String,
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(region: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            region: region.into(),
            key: key.into(),
            value,
        }
    }
}

/// Response body for storing an entry (PUT /regions/:region/entries)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    pub region: String,
    pub key: String,
    /// Entries pushed out of memory by this put
    pub evicted: usize,
    /// How many of those went to the overflow store
    pub passivated: usize,
}

impl PutResponse {
    pub fn new(region: impl Into<String>, key: impl Into<String>, outcome: &PutOutcome) -> Self {
        let region = region.into();
        let key = key.into();
        Self {
            message: format!("Key '{}' stored in region '{}'", key, region),
            region,
            key,
            evicted: outcome.evicted,
            passivated: outcome.passivated,
        }
    }
}

/// Response body for removing an entry (DELETE /regions/:region/entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub region: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(region: impl Into<String>, key: impl Into<String>) -> Self {
        let region = region.into();
        let key = key.into();
        Self {
            message: format!("Key '{}' removed from region '{}'", key, region),
            region,
            key,
        }
    }
}

/// Response body for clearing a region (DELETE /regions/:region/entries)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub region: String,
}

impl ClearResponse {
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            message: format!("Region '{}' cleared", region),
            region,
        }
    }
}

/// Response body for region statistics (GET /regions/:region/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub region: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub passivations: u64,
    pub activations: u64,
    pub passivation_failures: u64,
    /// Entries held in memory
    pub total_entries: usize,
    /// Entries held in the overflow store
    pub overflow_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from region statistics
    pub fn new(region: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            region: region.into(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            passivations: stats.passivations,
            activations: stats.activations,
            passivation_failures: stats.passivation_failures,
            total_entries: stats.total_entries,
            overflow_entries: stats.overflow_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// One row of the region listing
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub name: String,
    pub total_entries: usize,
    pub overflow_entries: usize,
}

/// Response body for the region listing (GET /regions)
#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    pub cluster_name: String,
    pub regions: Vec<RegionSummary>,
}

impl RegionsResponse {
    pub fn new(cluster_name: impl Into<String>, stats: Vec<(String, CacheStats)>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            regions: stats
                .into_iter()
                .map(|(name, stats)| RegionSummary {
                    name,
                    total_entries: stats.total_entries,
                    overflow_entries: stats.overflow_entries,
                })
                .collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self::with_status("healthy")
    }

    /// Reported once the manager has shut down
    pub fn closed() -> Self {
        Self::with_status("closed")
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
