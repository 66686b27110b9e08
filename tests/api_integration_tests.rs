//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use region_cache::{
    api::create_router, cache::ManualClock, AppState, ManagerConfig, RegionConfig, RegionManager,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// == Helper Functions ==

async fn create_test_app(region: region_cache::config::RegionConfigBuilder) -> (Router, RegionManager) {
    let config = ManagerConfig::builder()
        .default_region(region)
        .cluster_name("test-cluster")
        .build()
        .unwrap();
    let manager = RegionManager::start(config).await.unwrap();
    (create_router(AppState::new(manager.clone())), manager)
}

async fn local_app() -> Router {
    create_test_app(RegionConfig::builder().passivation(false)).await.0
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == PUT Endpoint Tests ==

#[tokio::test]
async fn test_put_endpoint_success() {
    let app = local_app().await;

    let (status, json) = send(
        &app,
        "PUT",
        "/regions/users/entries",
        Some(json!({"key": "42", "value": {"name": "Ada"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("42"));
    assert_eq!(json["region"], "users");
    assert_eq!(json["evicted"], 0);
}

#[tokio::test]
async fn test_put_reports_eviction() {
    let (app, _manager) =
        create_test_app(RegionConfig::builder().max_entries(2).passivation(false)).await;

    for key in ["a", "b"] {
        let (status, _) = send(&app, "PUT", "/regions/r/entries", Some(json!({"key": key, "value": key}))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, json) = send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "c", "value": "c"}))).await;
    assert_eq!(json["evicted"], 1);

    let (status, _) = send(&app, "GET", "/regions/r/entries/a", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = local_app().await;
    send(
        &app,
        "PUT",
        "/regions/users/entries",
        Some(json!({"key": "42", "value": [1, 2, 3]})),
    )
    .await;

    let (status, json) = send(&app, "GET", "/regions/users/entries/42", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "42");
    assert_eq!(json["value"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = local_app().await;

    let (status, json) = send(&app, "GET", "/regions/users/entries/missing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_regions_are_isolated() {
    let app = local_app().await;
    send(&app, "PUT", "/regions/a/entries", Some(json!({"key": "k", "value": 1}))).await;

    let (status, _) = send(&app, "GET", "/regions/b/entries/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = local_app().await;
    send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "k", "value": 1}))).await;

    let (status, json) = send(&app, "DELETE", "/regions/r/entries/k", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("removed"));

    let (status, _) = send(&app, "GET", "/regions/r/entries/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = local_app().await;

    let (status, _) = send(&app, "DELETE", "/regions/r/entries/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = local_app().await;
    for key in ["a", "b", "c"] {
        send(&app, "PUT", "/regions/r/entries", Some(json!({"key": key, "value": key}))).await;
    }

    let (status, _) = send(&app, "DELETE", "/regions/r/entries", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/regions/r/stats", None).await;
    assert_eq!(stats["total_entries"], 0);
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = local_app().await;
    send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "k", "value": 1}))).await;
    send(&app, "GET", "/regions/r/entries/k", None).await;
    send(&app, "GET", "/regions/r/entries/k", None).await;
    send(&app, "GET", "/regions/r/entries/nope", None).await;

    let (status, json) = send(&app, "GET", "/regions/r/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["region"], "r");
    assert_eq!(json["hits"], 2);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    let hit_rate = json["hit_rate"].as_f64().unwrap();
    assert!((hit_rate - 2.0 / 3.0).abs() < 0.001);
}

#[tokio::test]
async fn test_stats_unknown_region() {
    let app = local_app().await;

    let (status, _) = send(&app, "GET", "/regions/never/stats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regions_endpoint() {
    let app = local_app().await;
    send(&app, "PUT", "/regions/orders/entries", Some(json!({"key": "1", "value": 1}))).await;
    send(&app, "PUT", "/regions/customers/entries", Some(json!({"key": "1", "value": 1}))).await;

    let (status, json) = send(&app, "GET", "/regions", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cluster_name"], "test-cluster");
    let names: Vec<&str> = json["regions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["customers", "orders"]);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = local_app().await;

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Handling Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = local_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/regions/r/entries")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = local_app().await;

    let (status, json) = send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "", "value": 1}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_closed_manager_returns_unavailable() {
    let (app, manager) = create_test_app(RegionConfig::builder().passivation(false)).await;
    manager.shutdown().await;

    let (status, _) = send(&app, "GET", "/regions/r/entries/k", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "closed");
}

// == Expiration and Passivation ==

#[tokio::test]
async fn test_expiration_via_api() {
    let clock = Arc::new(ManualClock::new(0));
    let config = ManagerConfig::builder()
        .default_region(
            RegionConfig::builder()
                .lifespan_ms(1_000)
                .max_idle_ms(0)
                .passivation(false),
        )
        .build()
        .unwrap();
    let manager = RegionManager::start_with_clock(config, clock.clone())
        .await
        .unwrap();
    let app = create_router(AppState::new(manager));

    send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "k", "value": 1}))).await;

    clock.set(999);
    let (status, _) = send(&app, "GET", "/regions/r/entries/k", None).await;
    assert_eq!(status, StatusCode::OK);

    clock.set(1_000);
    let (status, _) = send(&app, "GET", "/regions/r/entries/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = send(&app, "GET", "/regions/r/stats", None).await;
    assert_eq!(stats["expirations"], 1);
}

#[tokio::test]
async fn test_passivation_via_api() {
    let dir = TempDir::new().unwrap();
    let (app, _manager) = create_test_app(
        RegionConfig::builder()
            .max_entries(1)
            .no_expiration()
            .overflow_location(dir.path()),
    )
    .await;

    send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "a", "value": "first"}))).await;
    let (_, json) = send(&app, "PUT", "/regions/r/entries", Some(json!({"key": "b", "value": "second"}))).await;
    assert_eq!(json["evicted"], 1);
    assert_eq!(json["passivated"], 1);

    // "a" comes back from the overflow store
    let (status, json) = send(&app, "GET", "/regions/r/entries/a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "first");

    let (_, stats) = send(&app, "GET", "/regions/r/stats", None).await;
    assert_eq!(stats["passivations"], 2);
    assert_eq!(stats["activations"], 1);
    assert_eq!(stats["overflow_entries"], 1);
}
