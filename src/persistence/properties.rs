//! Persistence Properties
//!
//! The property map handed to a persistence layer at bootstrap, assembled
//! from base defaults and an ordered list of property configurers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use super::access::RegionFactory;

// == Property Keys ==
pub const REGION_FACTORY: &str = "cache.region_factory";
pub const USE_SECOND_LEVEL_CACHE: &str = "cache.use_second_level_cache";
pub const USE_QUERY_CACHE: &str = "cache.use_query_cache";
pub const GENERATE_STATISTICS: &str = "generate_statistics";
pub const USE_STRUCTURED_ENTRIES: &str = "cache.use_structured_entries";
pub const SHARED_CACHE_MODE: &str = "shared_cache_mode";
pub const SHOW_SQL: &str = "show_sql";
pub const USE_SQL_COMMENTS: &str = "use_sql_comments";
pub const SCHEMA_ACTION: &str = "hbm2ddl.auto";

/// A step that adds or overrides persistence properties.
pub type PropertyConfigurer = Box<dyn FnOnce(PersistenceProperties) -> PersistenceProperties + Send>;

// == Persistence Properties ==
/// Ordered string-keyed property map. Later writes win.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PersistenceProperties {
    entries: BTreeMap<String, Value>,
}

impl PersistenceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults every persistence bootstrap starts from.
    pub fn base() -> Self {
        Self::new()
            .with(USE_SQL_COMMENTS, true)
            .with(SHOW_SQL, false)
            .with(SCHEMA_ACTION, "none")
    }

    /// Applies `configurers` in order on top of [`PersistenceProperties::base`].
    pub fn assemble<I>(configurers: I) -> Self
    where
        I: IntoIterator<Item = PropertyConfigurer>,
    {
        configurers
            .into_iter()
            .fold(Self::base(), |properties, configure| configure(properties))
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Properties that switch the second-level cache on and point it at
/// `factory`'s manager.
pub fn second_level_cache_properties(factory: &RegionFactory) -> PropertyConfigurer {
    let region_factory = json!({
        "type": std::any::type_name::<RegionFactory>(),
        "cluster_name": factory.manager().cluster_name(),
    });

    Box::new(move |properties: PersistenceProperties| {
        properties
            .with(REGION_FACTORY, region_factory)
            .with(USE_SECOND_LEVEL_CACHE, true)
            .with(USE_QUERY_CACHE, true)
            .with(GENERATE_STATISTICS, true)
            .with(USE_STRUCTURED_ENTRIES, true)
            .with(SHARED_CACHE_MODE, "ALL")
    })
}
