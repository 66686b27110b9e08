//! Manager Configuration
//!
//! Default region template, named templates and the configurer pipeline
//! that assembles them before the manager starts.

use std::collections::HashMap;

use crate::config::region::{CacheMode, RegionConfig, RegionConfigBuilder};
use crate::error::Result;

// == Template Names ==
pub const ENTITY_TEMPLATE: &str = "entity";
pub const QUERY_TEMPLATE: &str = "query";
pub const REPLICATED_QUERY_TEMPLATE: &str = "replicated-query";
pub const TIMESTAMPS_TEMPLATE: &str = "timestamps";
pub const PENDING_PUTS_TEMPLATE: &str = "pending-puts";

/// Idle timeout of the pending-puts template.
pub const PENDING_PUTS_MAX_IDLE_MS: u64 = 60_000;

/// Default cluster name reported by the manager.
pub const DEFAULT_CLUSTER_NAME: &str = "region-cache-cluster";

// == Configurer ==
/// A configuration step applied to the builder before the manager starts.
///
/// Configurers are applied in order; each receives the builder produced by
/// the previous one.
pub type Configurer = Box<dyn FnOnce(ManagerConfigBuilder) -> ManagerConfigBuilder + Send>;

// == Manager Config ==
/// Validated configuration for a [`crate::cache::RegionManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    default_region: RegionConfig,
    templates: HashMap<String, RegionConfig>,
    cluster_name: String,
    preregistered: Vec<String>,
}

impl ManagerConfig {
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::default()
    }

    /// Template used for region names without a dedicated template.
    pub fn default_region(&self) -> &RegionConfig {
        &self.default_region
    }

    pub fn templates(&self) -> &HashMap<String, RegionConfig> {
        &self.templates
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Region names created eagerly when the manager starts.
    pub fn preregistered(&self) -> &[String] {
        &self.preregistered
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_region: RegionConfig::default(),
            templates: HashMap::new(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            preregistered: Vec::new(),
        }
    }
}

// == Builder ==
/// Builder for [`ManagerConfig`].
///
/// Templates are kept as unvalidated builders until [`ManagerConfigBuilder::build`],
/// so every configuration error surfaces at startup.
#[derive(Debug, Clone)]
pub struct ManagerConfigBuilder {
    default_region: RegionConfigBuilder,
    templates: Vec<(String, RegionConfigBuilder)>,
    cluster_name: String,
    preregistered: Vec<String>,
}

impl Default for ManagerConfigBuilder {
    fn default() -> Self {
        Self {
            default_region: RegionConfigBuilder::default(),
            templates: Vec::new(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            preregistered: Vec::new(),
        }
    }
}

impl ManagerConfigBuilder {
    #[must_use]
    pub fn default_region(mut self, region: RegionConfigBuilder) -> Self {
        self.default_region = region;
        self
    }

    /// Returns a copy of the current default region builder.
    pub fn default_region_builder(&self) -> RegionConfigBuilder {
        self.default_region.clone()
    }

    /// Registers a template; a later definition under the same name wins.
    #[must_use]
    pub fn define_template(mut self, name: impl Into<String>, template: RegionConfigBuilder) -> Self {
        let name = name.into();
        self.templates.retain(|(existing, _)| *existing != name);
        self.templates.push((name, template));
        self
    }

    /// Registers a template derived from the current default region.
    #[must_use]
    pub fn derive_template<F>(self, name: impl Into<String>, customize: F) -> Self
    where
        F: FnOnce(RegionConfigBuilder) -> RegionConfigBuilder,
    {
        let template = customize(self.default_region_builder());
        self.define_template(name, template)
    }

    #[must_use]
    pub fn cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = name.into();
        self
    }

    #[must_use]
    pub fn preregister(mut self, region: impl Into<String>) -> Self {
        self.preregistered.push(region.into());
        self
    }

    /// Applies a single configurer.
    #[must_use]
    pub fn apply<F>(self, configurer: F) -> Self
    where
        F: FnOnce(ManagerConfigBuilder) -> ManagerConfigBuilder,
    {
        configurer(self)
    }

    /// Applies configurers in order.
    #[must_use]
    pub fn apply_all<I>(self, configurers: I) -> Self
    where
        I: IntoIterator<Item = Configurer>,
    {
        configurers
            .into_iter()
            .fold(self, |builder, configurer| configurer(builder))
    }

    /// Validates the default region and every template.
    pub fn build(self) -> Result<ManagerConfig> {
        let default_region = self.default_region.build("default")?;

        let mut templates = HashMap::with_capacity(self.templates.len());
        for (name, template) in self.templates {
            let config = template.build(&name)?;
            templates.insert(name, config);
        }

        Ok(ManagerConfig {
            default_region,
            templates,
            cluster_name: self.cluster_name,
            preregistered: self.preregistered,
        })
    }
}

// == Stock Configurers ==
/// Registers the second-level cache templates derived from the default region:
/// `entity` and `query` (invalidation), `replicated-query` and `timestamps`
/// (replication), `pending-puts` (local, idle expiration only, no overflow).
pub fn second_level_cache_templates(builder: ManagerConfigBuilder) -> ManagerConfigBuilder {
    builder
        .derive_template(ENTITY_TEMPLATE, |t| t.cache_mode(CacheMode::InvalidationAsync))
        .derive_template(QUERY_TEMPLATE, |t| t.cache_mode(CacheMode::InvalidationAsync))
        .derive_template(REPLICATED_QUERY_TEMPLATE, |t| {
            t.cache_mode(CacheMode::ReplicatedAsync)
        })
        .derive_template(TIMESTAMPS_TEMPLATE, |t| t.cache_mode(CacheMode::ReplicatedAsync))
        .derive_template(PENDING_PUTS_TEMPLATE, |t| {
            t.cache_mode(CacheMode::Local)
                .lifespan_ms(0)
                .max_idle_ms(PENDING_PUTS_MAX_IDLE_MS)
                .passivation(false)
        })
}
