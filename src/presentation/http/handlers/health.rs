//! Health Check Handlers
//!
//! Liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (can the server accept traffic?)

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::infrastructure::health::HealthProbe;
use crate::startup::AppState;

/// Upper bound for a single probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: BTreeMap<&'static str, ServiceHealth>,
    pub websocket: WebSocketHealth,
}

/// Health status for individual services
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub critical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// WebSocket gateway health
#[derive(Debug, Serialize)]
pub struct WebSocketHealth {
    pub status: HealthStatus,
    pub active_connections: usize,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - 503 when a critical dependency is down
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = BTreeMap::new();
    for probe in state.probes.iter() {
        checks.insert(probe.name(), run_probe(probe.as_ref()).await);
    }

    let overall_status = determine_overall_status(checks.values());

    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks,
        websocket: WebSocketHealth {
            status: HealthStatus::Healthy,
            active_connections: state.gateway.session_count(),
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Check one dependency and measure its latency
async fn run_probe(probe: &dyn HealthProbe) -> ServiceHealth {
    let start = Instant::now();
    let result = match tokio::time::timeout(PROBE_TIMEOUT, probe.check()).await {
        Ok(result) => result,
        Err(_) => Err(format!("{} check timed out", probe.name())),
    };

    match result {
        Ok(()) => {
            let latency = start.elapsed();
            ServiceHealth {
                status: if latency < probe.degraded_after() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                critical: probe.is_critical(),
                latency_ms: Some(latency.as_millis() as u64),
                message: None,
            }
        }
        Err(message) => {
            tracing::warn!(probe = probe.name(), error = %message, "Readiness check failed");
            ServiceHealth {
                status: HealthStatus::Unhealthy,
                critical: probe.is_critical(),
                latency_ms: None,
                message: Some(message),
            }
        }
    }
}

/// Determine overall health based on individual checks
fn determine_overall_status<'a>(checks: impl IntoIterator<Item = &'a ServiceHealth>) -> HealthStatus {
    let mut overall = HealthStatus::Healthy;
    for check in checks {
        match (check.status, check.critical) {
            (HealthStatus::Unhealthy, true) => return HealthStatus::Unhealthy,
            (HealthStatus::Healthy, _) => {}
            _ => overall = HealthStatus::Degraded,
        }
    }
    overall
}
