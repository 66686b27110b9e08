//! Expiration Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! region, so entries nobody reads again still leave memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::RegionManager;
use crate::error::CacheError;

/// Spawns a background task that sweeps expired entries every
/// `sweep_interval_secs` seconds.
///
/// The loop ends on its own once the manager is closed. The returned handle
/// can also be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(manager.clone(), 1);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(manager: RegionManager, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiration sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match manager.sweep_expired().await {
                Ok(0) => debug!("Expiration sweep: no expired entries found"),
                Ok(removed) => info!("Expiration sweep: removed {} expired entries", removed),
                Err(CacheError::ManagerClosed) => {
                    info!("Region manager closed, stopping expiration sweep");
                    break;
                }
                Err(err) => warn!(error = %err, "Expiration sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::config::{ManagerConfig, RegionConfig};
    use serde_json::json;
    use std::sync::Arc;

    async fn manager_with_clock(lifespan_ms: u64) -> (RegionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let config = ManagerConfig::builder()
            .default_region(
                RegionConfig::builder()
                    .lifespan_ms(lifespan_ms)
                    .max_idle_ms(0)
                    .passivation(false),
            )
            .build()
            .unwrap();
        let manager = RegionManager::start_with_clock(config, clock.clone())
            .await
            .unwrap();
        (manager, clock)
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (manager, clock) = manager_with_clock(1_000).await;
        let region = manager.get_or_create_region("r").await.unwrap();
        region.put("expire_soon", json!("value")).await.unwrap();

        clock.set(1_000);
        let handle = spawn_sweep_task(manager.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        // Counted by the sweep, not by a lazy read
        assert_eq!(region.size().await.unwrap(), 0);
        assert_eq!(region.stats().await.expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (manager, clock) = manager_with_clock(60_000).await;
        let region = manager.get_or_create_region("r").await.unwrap();
        region.put("long_lived", json!("value")).await.unwrap();

        clock.set(1_000);
        let handle = spawn_sweep_task(manager.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(region.get("long_lived").await.unwrap(), Some(json!("value")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_stops_after_shutdown() {
        let (manager, _clock) = manager_with_clock(1_000).await;
        manager.shutdown().await;

        let handle = spawn_sweep_task(manager, 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(handle.is_finished(), "Task should stop once the manager is closed");
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (manager, _clock) = manager_with_clock(1_000).await;

        let handle = spawn_sweep_task(manager, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
