//! Persistence Module
//!
//! Hooks a persistence layer into the region manager: typed region lookup,
//! keyed access, and the property map that enables second-level caching.

mod access;
mod properties;

pub use access::{RegionAccess, RegionFactory, RegionKind};
pub use properties::{
    second_level_cache_properties, PersistenceProperties, PropertyConfigurer, GENERATE_STATISTICS,
    REGION_FACTORY, SCHEMA_ACTION, SHARED_CACHE_MODE, SHOW_SQL, USE_QUERY_CACHE,
    USE_SECOND_LEVEL_CACHE, USE_SQL_COMMENTS, USE_STRUCTURED_ENTRIES,
};
