//! Region Cache - named second-level cache regions for a persistence layer
//!
//! Bounded in-memory regions with LRU eviction, lifespan and idle expiration,
//! passivation to a disk-backed overflow store, and an HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod tasks;

pub use api::AppState;
pub use cache::{Region, RegionManager};
pub use config::{Config, ManagerConfig, RegionConfig};
pub use error::{CacheError, Result};
pub use persistence::{PersistenceProperties, RegionAccess, RegionFactory, RegionKind};
pub use tasks::spawn_sweep_task;
