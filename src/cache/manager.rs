//! Region Manager Module
//!
//! Owns the named regions of a process and the templates they are built from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::cache::{CacheStats, Region, SharedClock, SystemClock};
use crate::config::{ManagerConfig, RegionConfig};
use crate::error::{CacheError, Result};

// == Region Manager ==
/// Handle to a set of independently configured regions.
///
/// Cloning is cheap and every clone refers to the same regions. Once
/// [`RegionManager::shutdown`] has run, every operation fails with
/// [`CacheError::ManagerClosed`].
#[derive(Clone)]
pub struct RegionManager {
    inner: Arc<ManagerInner>,
}

/// Slot for one region name. It is filled once, outside the map lock, so a
/// slow overflow replay never holds up lookups of other regions.
type RegionCell = Arc<OnceCell<Arc<Region>>>;

struct ManagerInner {
    default_template: RegionConfig,
    templates: RwLock<HashMap<String, RegionConfig>>,
    regions: RwLock<HashMap<String, RegionCell>>,
    cluster_name: String,
    clock: SharedClock,
    closed: AtomicBool,
}

impl RegionManager {
    // == Start ==
    /// Starts a manager on the system clock.
    pub async fn start(config: ManagerConfig) -> Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Starts a manager: prepares overflow locations, then creates the
    /// pre-registered regions (applying purge-on-startup to their logs).
    pub async fn start_with_clock(config: ManagerConfig, clock: SharedClock) -> Result<Self> {
        let passivating = std::iter::once(config.default_region())
            .chain(config.templates().values())
            .filter(|template| template.passivation());
        for template in passivating {
            let path = template.overflow_location();
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|source| CacheError::OverflowLocation {
                    path: path.clone(),
                    source,
                })?;
        }

        let manager = Self {
            inner: Arc::new(ManagerInner {
                default_template: config.default_region().clone(),
                templates: RwLock::new(config.templates().clone()),
                regions: RwLock::new(HashMap::new()),
                cluster_name: config.cluster_name().to_string(),
                clock,
                closed: AtomicBool::new(false),
            }),
        };

        for name in config.preregistered() {
            manager.get_or_create_region(name).await?;
        }

        info!(
            cluster = %manager.inner.cluster_name,
            templates = config.templates().len(),
            preregistered = config.preregistered().len(),
            "Region manager started"
        );
        Ok(manager)
    }

    pub fn cluster_name(&self) -> &str {
        &self.inner.cluster_name
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(CacheError::ManagerClosed)
        } else {
            Ok(())
        }
    }

    // == Templates ==
    /// Registers or replaces a template.
    ///
    /// Regions already built keep the configuration they were created with.
    pub async fn define_template(&self, name: impl Into<String>, config: RegionConfig) -> Result<()> {
        self.ensure_open()?;
        let name = name.into();
        debug!(template = %name, "Template defined");
        self.inner.templates.write().await.insert(name, config);
        Ok(())
    }

    pub async fn template(&self, name: &str) -> Result<Option<RegionConfig>> {
        self.ensure_open()?;
        Ok(self.inner.templates.read().await.get(name).cloned())
    }

    pub fn default_template(&self) -> &RegionConfig {
        &self.inner.default_template
    }

    pub async fn template_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut names: Vec<String> = self.inner.templates.read().await.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    // == Regions ==
    /// Returns the region called `name`, creating it from the template of the
    /// same name (or the default template) on first use.
    pub async fn get_or_create_region(&self, name: &str) -> Result<Arc<Region>> {
        self.get_or_create_region_with_template(name, name).await
    }

    /// Returns the region called `name`, creating it from `template` on first
    /// use. Unknown templates fall back to the default template.
    pub async fn get_or_create_region_with_template(
        &self,
        name: &str,
        template: &str,
    ) -> Result<Arc<Region>> {
        self.ensure_open()?;
        let cell = self.region_cell(name).await?;

        // Concurrent first callers share the one open; a failed open leaves
        // the cell empty for the next caller to retry
        let region = cell
            .get_or_try_init(|| self.open_region(name, template))
            .await
            .map(Arc::clone)?;

        // Shutdown may have drained the map while the region was opening
        if self.is_closed() {
            region.shutdown().await;
            return Err(CacheError::ManagerClosed);
        }
        Ok(region)
    }

    async fn region_cell(&self, name: &str) -> Result<RegionCell> {
        if let Some(cell) = self.inner.regions.read().await.get(name) {
            return Ok(Arc::clone(cell));
        }

        let mut regions = self.inner.regions.write().await;
        // Shutdown drains the map under this lock
        self.ensure_open()?;
        Ok(Arc::clone(regions.entry(name.to_string()).or_default()))
    }

    async fn open_region(&self, name: &str, template: &str) -> Result<Arc<Region>> {
        let config = match self.inner.templates.read().await.get(template) {
            Some(config) => config.clone(),
            None => {
                debug!(region = %name, template, "No matching template, using default");
                self.inner.default_template.clone()
            }
        };

        let region = Region::open(name, config, Arc::clone(&self.inner.clock)).await?;
        Ok(Arc::new(region))
    }

    /// Returns an existing region without creating it.
    ///
    /// A region still being opened does not exist yet.
    pub async fn region(&self, name: &str) -> Result<Option<Arc<Region>>> {
        self.ensure_open()?;
        Ok(self
            .inner
            .regions
            .read()
            .await
            .get(name)
            .and_then(|cell| cell.get().cloned()))
    }

    pub async fn region_names(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut names: Vec<String> = self
            .inner
            .regions
            .read()
            .await
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Snapshot of the current regions, so callers never hold the map lock
    /// while working on a region.
    async fn snapshot(&self) -> Vec<Arc<Region>> {
        self.inner
            .regions
            .read()
            .await
            .values()
            .filter_map(|cell| cell.get().cloned())
            .collect()
    }

    // == Stats ==
    /// Statistics of every region, sorted by region name.
    pub async fn all_stats(&self) -> Result<Vec<(String, CacheStats)>> {
        self.ensure_open()?;
        let mut all = Vec::new();
        for region in self.snapshot().await {
            all.push((region.name().to_string(), region.stats().await));
        }
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    // == Sweep ==
    /// Removes expired entries from every region, one region at a time.
    pub async fn sweep_expired(&self) -> Result<usize> {
        self.ensure_open()?;
        let mut removed = 0;
        for region in self.snapshot().await {
            removed += region.sweep_expired().await?;
        }
        Ok(removed)
    }

    // == Shutdown ==
    /// Flushes every region to its overflow store and releases all regions.
    ///
    /// Returns the number of entries flushed. Calling it again is a no-op.
    pub async fn shutdown(&self) -> usize {
        let mut regions = self.inner.regions.write().await;
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let mut flushed = 0;
        for (_, cell) in regions.drain() {
            if let Some(region) = cell.get() {
                flushed += region.shutdown().await;
            }
        }

        info!(flushed, "Region manager shut down");
        flushed
    }
}

impl std::fmt::Debug for RegionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionManager")
            .field("cluster_name", &self.inner.cluster_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
