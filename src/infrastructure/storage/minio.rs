//! MinIO object store over the S3 REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header::CONTENT_LENGTH, Client, Method, Response, StatusCode};
use tracing::{debug, info, instrument, warn};

use super::sigv4::{self, Credentials};
use crate::config::ObjectStoreSettings;
use crate::domain::ObjectStore;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Path-style S3 client bound to one bucket.
#[derive(Clone)]
pub struct MinioStore {
    http: Client,
    base_url: String,
    /// Host header value the server will see
    host: String,
    bucket: String,
    credentials: Credentials,
}

impl MinioStore {
    /// Create a client from settings. No request is made until first use.
    pub fn new(settings: &ObjectStoreSettings) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url(),
            host: signing_host(&settings.endpoint, settings.secure),
            bucket: settings.bucket_name.clone(),
            credentials: Credentials {
                access_key: settings.access_key.clone(),
                secret_key: settings.secret_key.clone(),
                region: settings.region.clone(),
            },
        })
    }

    fn bucket_path(&self) -> String {
        format!("/{}", sigv4::uri_encode(&self.bucket, false))
    }

    fn object_path(&self, object_name: &str) -> String {
        format!(
            "/{}/{}",
            sigv4::uri_encode(&self.bucket, false),
            sigv4::uri_encode(object_name, true)
        )
    }

    fn presign(&self, method: &str, object_name: &str, ttl: Duration) -> String {
        let path = self.object_path(object_name);
        let query = sigv4::presign_query(
            &self.credentials,
            method,
            &self.host,
            &path,
            ttl.as_secs(),
            Utc::now(),
        );
        format!("{}{}?{}", self.base_url, path, query)
    }

    /// Send a header-signed request without a body.
    async fn send(&self, method: Method, path: &str) -> Result<Response, AppError> {
        let signed = sigv4::sign_headers(
            &self.credentials,
            method.as_str(),
            &self.host,
            path,
            Utc::now(),
        );

        let response = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header(reqwest::header::AUTHORIZATION, signed.authorization)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Object store request failed: {}", e)))?;

        Ok(response)
    }

    async fn bucket_exists(&self) -> Result<bool, AppError> {
        match self.send(Method::HEAD, &self.bucket_path()).await?.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AppError::Storage(format!(
                "Unexpected status {} checking bucket {}",
                status, self.bucket
            ))),
        }
    }
}

/// `Content-Length` of a `HEAD` response.
fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Host as it appears in the `Host` header, default ports dropped.
fn signing_host(endpoint: &str, secure: bool) -> String {
    let default_port = if secure { ":443" } else { ":80" };
    endpoint
        .strip_suffix(default_port)
        .unwrap_or(endpoint)
        .to_string()
}

#[async_trait]
impl ObjectStore for MinioStore {
    fn bucket(&self) -> String {
        self.bucket.clone()
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn ensure_bucket(&self) -> Result<(), AppError> {
        if self.bucket_exists().await? {
            info!("Object store bucket already exists");
            return Ok(());
        }

        let status = self.send(Method::PUT, &self.bucket_path()).await?.status();
        // 409 means another instance created it first
        if status.is_success() || status == StatusCode::CONFLICT {
            info!("Created object store bucket");
            Ok(())
        } else {
            Err(AppError::Storage(format!(
                "Failed to create bucket {}: status {}",
                self.bucket, status
            )))
        }
    }

    fn presigned_put_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError> {
        let url = self.presign("PUT", object_name, ttl);
        metrics::record_object_store_op("presign_put", true);
        Ok(url)
    }

    fn presigned_get_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError> {
        let url = self.presign("GET", object_name, ttl);
        metrics::record_object_store_op("presign_get", true);
        Ok(url)
    }

    #[instrument(skip(self), level = "debug")]
    async fn object_size(&self, object_name: &str) -> Result<Option<u64>, AppError> {
        let result = match self.send(Method::HEAD, &self.object_path(object_name)).await {
            Ok(response) if response.status().is_success() => {
                content_length(&response).map(Some).ok_or_else(|| {
                    AppError::Storage(format!("Missing Content-Length for object {}", object_name))
                })
            }
            Ok(response) if response.status() == StatusCode::NOT_FOUND => Ok(None),
            Ok(response) => Err(AppError::Storage(format!(
                "Unexpected status {} checking object {}",
                response.status(),
                object_name
            ))),
            Err(e) => Err(e),
        };
        metrics::record_object_store_op("head_object", result.is_ok());
        debug!(size = ?result.as_ref().ok(), "Object size checked");
        result
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, object_name: &str) -> Result<(), AppError> {
        let status = self
            .send(Method::DELETE, &self.object_path(object_name))
            .await?
            .status();
        let ok = status.is_success() || status == StatusCode::NOT_FOUND;
        metrics::record_object_store_op("delete_object", ok);

        if ok {
            info!("Object deleted");
            Ok(())
        } else {
            warn!(status = %status, "Object delete failed");
            Err(AppError::Storage(format!(
                "Failed to delete object {}: status {}",
                object_name, status
            )))
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.bucket_exists().await.map(|_| ())
    }
}
