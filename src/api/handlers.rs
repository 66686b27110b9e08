//! API Handlers
//!
//! HTTP request handlers for each region cache endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::cache::RegionManager;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse,
    RegionsResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The manager handle is cheap to clone and does its own locking, so the
/// state needs no outer lock.
#[derive(Clone)]
pub struct AppState {
    pub manager: RegionManager,
}

impl AppState {
    pub fn new(manager: RegionManager) -> Self {
        Self { manager }
    }
}

/// Handler for PUT /regions/:region/entries
///
/// Stores a key-value pair, creating the region from its template on first use.
pub async fn put_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let handle = state.manager.get_or_create_region(&region).await?;
    let outcome = handle.put(req.key.clone(), req.value).await?;
    if outcome.evicted > 0 {
        debug!(region = %region, evicted = outcome.evicted, passivated = outcome.passivated, "Put evicted entries");
    }

    Ok(Json(PutResponse::new(region, req.key, &outcome)))
}

/// Handler for GET /regions/:region/entries/:key
///
/// A miss is reported as 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((region, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let handle = state.manager.get_or_create_region(&region).await?;
    match handle.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(region, key, value))),
        None => Err(CacheError::NotFound(format!(
            "Key '{}' not found in region '{}'",
            key, region
        ))),
    }
}

/// Handler for DELETE /regions/:region/entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((region, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let handle = state.manager.get_or_create_region(&region).await?;
    if !handle.remove(&key).await? {
        return Err(CacheError::NotFound(format!(
            "Key '{}' not found in region '{}'",
            key, region
        )));
    }

    Ok(Json(DeleteResponse::new(region, key)))
}

/// Handler for DELETE /regions/:region/entries
///
/// Drops every entry, in memory and in the overflow store.
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<ClearResponse>> {
    let handle = state.manager.get_or_create_region(&region).await?;
    handle.clear().await?;

    Ok(Json(ClearResponse::new(region)))
}

/// Handler for GET /regions/:region/stats
///
/// Only reports regions that already exist.
pub async fn region_stats_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<StatsResponse>> {
    let handle = state
        .manager
        .region(&region)
        .await?
        .ok_or_else(|| CacheError::NotFound(format!("Region '{}' not found", region)))?;
    let stats = handle.stats().await;

    Ok(Json(StatsResponse::new(region, &stats)))
}

/// Handler for GET /regions
pub async fn regions_handler(State(state): State<AppState>) -> Result<Json<RegionsResponse>> {
    let stats = state.manager.all_stats().await?;

    Ok(Json(RegionsResponse::new(state.manager.cluster_name(), stats)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    if state.manager.is_closed() {
        Json(HealthResponse::closed())
    } else {
        Json(HealthResponse::healthy())
    }
}
