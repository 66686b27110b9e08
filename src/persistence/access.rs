//! Region Access
//!
//! The contract a persistence layer uses to reach the cache, and the adapter
//! that serves it from a [`RegionManager`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{Region, RegionManager};
use crate::config::{
    ENTITY_TEMPLATE, PENDING_PUTS_TEMPLATE, QUERY_TEMPLATE, REPLICATED_QUERY_TEMPLATE,
    TIMESTAMPS_TEMPLATE,
};
use crate::error::Result;

// == Region Kind ==
/// The role a region plays for the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    Entity,
    Collection,
    NaturalId,
    Query,
    ReplicatedQuery,
    Timestamps,
    PendingPuts,
}

impl RegionKind {
    /// Template a region of this kind is created from.
    pub fn template_name(self) -> &'static str {
        match self {
            RegionKind::Entity | RegionKind::Collection | RegionKind::NaturalId => ENTITY_TEMPLATE,
            RegionKind::Query => QUERY_TEMPLATE,
            RegionKind::ReplicatedQuery => REPLICATED_QUERY_TEMPLATE,
            RegionKind::Timestamps => TIMESTAMPS_TEMPLATE,
            RegionKind::PendingPuts => PENDING_PUTS_TEMPLATE,
        }
    }
}

// == Region Access ==
/// Lookup-and-store interface a persistence layer implements against.
///
/// Regions are addressed by logical name. `region` resolves the template
/// from the kind; the keyed operations use whatever region already exists
/// under that name, or create it from the matching or default template.
#[async_trait]
pub trait RegionAccess: Send + Sync {
    async fn region(&self, kind: RegionKind, name: &str) -> Result<Arc<Region>>;

    async fn get(&self, region: &str, key: &str) -> Result<Option<Value>>;

    async fn put(&self, region: &str, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, region: &str, key: &str) -> Result<bool>;

    async fn evict_all(&self, region: &str) -> Result<()>;
}

// == Region Factory ==
/// Serves [`RegionAccess`] from an explicitly passed manager handle.
#[derive(Debug, Clone)]
pub struct RegionFactory {
    manager: RegionManager,
}

impl RegionFactory {
    pub fn new(manager: RegionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &RegionManager {
        &self.manager
    }
}

#[async_trait]
impl RegionAccess for RegionFactory {
    async fn region(&self, kind: RegionKind, name: &str) -> Result<Arc<Region>> {
        debug!(region = %name, ?kind, "Resolving persistence region");
        self.manager
            .get_or_create_region_with_template(name, kind.template_name())
            .await
    }

    async fn get(&self, region: &str, key: &str) -> Result<Option<Value>> {
        self.manager.get_or_create_region(region).await?.get(key).await
    }

    async fn put(&self, region: &str, key: &str, value: Value) -> Result<()> {
        let region = self.manager.get_or_create_region(region).await?;
        region.put(key, value).await?;
        Ok(())
    }

    async fn remove(&self, region: &str, key: &str) -> Result<bool> {
        self.manager.get_or_create_region(region).await?.remove(key).await
    }

    async fn evict_all(&self, region: &str) -> Result<()> {
        match self.manager.region(region).await? {
            Some(region) => region.clear().await,
            None => Ok(()),
        }
    }
}
