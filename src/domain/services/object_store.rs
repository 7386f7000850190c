//! Object storage contract used for chat images.

use std::time::Duration;

use async_trait::async_trait;

use crate::shared::error::AppError;

/// S3-compatible blob storage scoped to a single private bucket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket all objects live in.
    fn bucket(&self) -> String;

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(&self) -> Result<(), AppError>;

    /// URL a client can `PUT` the object to until `ttl` elapses.
    fn presigned_put_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError>;

    /// URL a client can `GET` the object from until `ttl` elapses.
    fn presigned_get_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError>;

    /// Size in bytes of a stored object, `None` when it does not exist.
    async fn object_size(&self, object_name: &str) -> Result<Option<u64>, AppError>;

    async fn delete_object(&self, object_name: &str) -> Result<(), AppError>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}
