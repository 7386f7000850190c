//! Health, docs and metrics endpoint tests

use std::sync::Arc;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

use l2p_backend::infrastructure::health::HealthProbe;

use crate::common::{StaticProbe, TestApp};

fn probes(database_up: bool, cache_up: bool) -> Vec<Arc<dyn HealthProbe>> {
    vec![
        Arc::new(StaticProbe {
            name: "database",
            critical: true,
            healthy: database_up,
        }),
        Arc::new(StaticProbe {
            name: "cache",
            critical: false,
            healthy: cache_up,
        }),
    ]
}

#[tokio::test]
async fn test_health_and_liveness() {
    let app = TestApp::new();

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "healthy");

    let live = app.server.get("/health/live").await;
    live.assert_status_ok();
    assert_eq!(live.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_all_healthy() {
    let app = TestApp::with_probes(probes(true, true));

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
    assert_eq!(body["checks"]["database"]["critical"], true);
    assert_eq!(body["checks"]["cache"]["status"], "healthy");
    assert_eq!(body["websocket"]["active_connections"], 0);
}

#[tokio::test]
async fn test_readiness_critical_failure() {
    let app = TestApp::with_probes(probes(false, true));

    let response = app.server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "unhealthy");
    assert!(body["checks"]["database"]["message"].is_string());
}

#[tokio::test]
async fn test_readiness_degraded_by_optional_probe() {
    let app = TestApp::with_probes(probes(true, false));

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "degraded");
}

#[tokio::test]
async fn test_docs_catalogue() {
    let app = TestApp::new();

    let page = app.server.get("/docs").await;
    page.assert_status_ok();
    assert!(page.text().contains("/friends/search"));

    let routes: Value = app.server.get("/docs/routes").await.json();
    let login = routes
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["path"] == "/auth/login")
        .expect("login documented");
    assert_eq!(login["method"], "POST");
    assert_eq!(login["authenticated"], false);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let app = TestApp::new();
    app.server.get("/health").await.assert_status_ok();

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("l2p_http_requests_total"));
}
