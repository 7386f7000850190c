//! Chat image object paths.
//!
//! A stored image path has the form
//! `{bucket}/chat-images/{friendship_id}/{YYYYMMDD}/{uuid}.{ext}`.

use chrono::{DateTime, Utc};

use crate::shared::error::AppError;

/// Top-level directory for all chat images inside the bucket.
pub const CHAT_IMAGES_DIR: &str = "chat-images";

/// A validated chat image path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    bucket: String,
    friendship_id: i64,
    object_name: String,
}

impl ImagePath {
    /// Parse and check a client-supplied path against the configured bucket.
    pub fn parse(path: &str, expected_bucket: &str) -> Result<Self, AppError> {
        let parts: Vec<&str> = path.split('/').collect();
        // relative or empty segments would be normalised away before signing
        if parts.len() < 4 || parts.iter().any(|p| matches!(*p, "" | "." | "..")) {
            return Err(AppError::validation("Invalid image_path format"));
        }

        if parts[0] != expected_bucket {
            return Err(AppError::validation("Invalid bucket in image_path"));
        }

        if parts[1] != CHAT_IMAGES_DIR {
            return Err(AppError::validation(
                "Invalid path: must be in chat-images directory",
            ));
        }

        let friendship_id = parts[2]
            .parse::<i64>()
            .map_err(|_| AppError::validation("Invalid friendship_id in image_path"))?;

        Ok(Self {
            bucket: parts[0].to_string(),
            friendship_id,
            object_name: parts[1..].join("/"),
        })
    }

    /// Build a fresh object path for an upload into `friendship_id`.
    pub fn generate(
        bucket: &str,
        friendship_id: i64,
        filename: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or("jpg");

        let object_name = format!(
            "{}/{}/{}/{}.{}",
            CHAT_IMAGES_DIR,
            friendship_id,
            now.format("%Y%m%d"),
            uuid::Uuid::new_v4(),
            extension
        );

        Self {
            bucket: bucket.to_string(),
            friendship_id,
            object_name,
        }
    }

    pub fn friendship_id(&self) -> i64 {
        self.friendship_id
    }

    /// Key inside the bucket (`chat-images/...`).
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Full `{bucket}/{object_name}` path as stored on messages.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.bucket, self.object_name)
    }
}

/// Object name of a stored image path, without its bucket segment.
pub fn object_name_of(image_path: &str) -> &str {
    image_path
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(image_path)
}
