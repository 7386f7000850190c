//! Object Storage Module
//!
//! S3-compatible storage for chat images, signed with AWS Signature V4.

mod minio;
pub mod sigv4;

pub use minio::MinioStore;
