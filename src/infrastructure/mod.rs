//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL)
//! - Cache-backed stores (Redis)
//! - Object storage (MinIO / S3)
//! - Prometheus metrics
//! - Readiness probes

pub mod cache;
pub mod database;
pub mod health;
pub mod metrics;
pub mod repositories;
pub mod storage;
