//! Readiness probes for backing services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use sqlx::PgPool;

use crate::domain::ObjectStore;

/// A dependency checked by `GET /health/ready`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Key used in the readiness report.
    fn name(&self) -> &'static str;

    /// When a critical probe fails the service reports itself unavailable.
    fn is_critical(&self) -> bool {
        false
    }

    /// Latency above which a passing check counts as degraded.
    fn degraded_after(&self) -> Duration {
        Duration::from_millis(100)
    }

    async fn check(&self) -> Result<(), String>;
}

/// PostgreSQL `SELECT 1`.
pub struct DatabaseProbe {
    pool: PgPool,
}

impl DatabaseProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for DatabaseProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    fn is_critical(&self) -> bool {
        true
    }

    async fn check(&self) -> Result<(), String> {
        super::database::ping(&self.pool)
            .await
            .map_err(|e| format!("Database connection failed: {}", e))
    }
}

/// Redis `PING`.
pub struct CacheProbe {
    conn: ConnectionManager,
}

impl CacheProbe {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl HealthProbe for CacheProbe {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn degraded_after(&self) -> Duration {
        Duration::from_millis(50)
    }

    async fn check(&self) -> Result<(), String> {
        super::cache::ping(&self.conn)
            .await
            .map_err(|e| format!("Redis connection failed: {}", e))
    }
}

/// Bucket lookup on the object store.
pub struct ObjectStoreProbe {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreProbe {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthProbe for ObjectStoreProbe {
    fn name(&self) -> &'static str {
        "object_store"
    }

    fn degraded_after(&self) -> Duration {
        Duration::from_millis(250)
    }

    async fn check(&self) -> Result<(), String> {
        self.store
            .ping()
            .await
            .map_err(|e| format!("Object store unreachable: {}", e))
    }
}
