//! Cache Module
//!
//! Named cache regions with bounded memory, LRU eviction, lifespan and idle
//! expiration, and optional passivation to a disk-backed overflow store.

mod clock;
mod entry;
mod expiration;
mod lru;
mod manager;
mod overflow;
mod region;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::{approximate_size, CacheEntry};
pub use expiration::ExpirationPolicy;
pub use lru::LruTracker;
pub use manager::RegionManager;
pub use overflow::{log_file_name, sanitize_file_name, OverflowStore, PassivatedEntry};
pub use region::{PutOutcome, Region};
pub use stats::CacheStats;
pub use store::{EntryStore, Evicted};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
