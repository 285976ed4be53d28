//! S3 store module
//!
//! The uploader talks to the remote object store through the [`ObjectStore`]
//! trait, which exposes the only two operations it needs: an existence check
//! and a single-request upload. [`S3Store`] implements it on top of
//! `aws-sdk-s3` for any S3-compatible endpoint.
//!
//! # Example
//!
//! ```no_run
//! use s3_safe_upload::config::StoreConfig;
//! use s3_safe_upload::s3::{ByteStream, ObjectStore, S3Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new("http://localhost:9000", "access", "secret", "backups");
//! let store = S3Store::new(&config)?;
//!
//! if !store.object_exists("backups", "report.json").await? {
//!     let body = ByteStream::from_path("report.json").await?;
//!     let response = store.put_object("backups", "report.json", body).await?;
//!     println!("ETag: {:?}", response.etag);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | HeadObject | `s3.head_object` | bucket, key, found |
//! | PutObject | `s3.put_object` | bucket, key, bytes, etag |

use async_trait::async_trait;
use thiserror::Error;

pub mod client;

pub use aws_sdk_s3::primitives::ByteStream;
pub use client::S3Store;

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request never produced a service response (connection refused,
    /// timeout, DNS failure, request construction)
    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Service error ({code}): {message}")]
    ServiceError {
        code: String,
        message: String,
        status: Option<u16>,
    },
}

impl S3ClientError {
    /// HTTP status of the service response, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceError { status, .. } => *status,
            _ => None,
        }
    }
}

/// S3 PutObject response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectResponse {
    pub etag: Option<String>,
    pub bytes_written: u64,
}

/// Remote object store operations used by the uploader
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether `key` exists in `bucket`.
    ///
    /// Returns `Ok(false)` only when the store reports the object as not
    /// found. Every other failure is an error.
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, S3ClientError>;

    /// Store `body` under `key` in `bucket` with private access in a single
    /// request. The body is streamed, so a file-backed [`ByteStream`] is
    /// never held in memory as a whole.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
    ) -> Result<PutObjectResponse, S3ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_service_errors() {
        let service = S3ClientError::ServiceError {
            code: "AccessDenied".into(),
            message: "forbidden".into(),
            status: Some(403),
        };
        assert_eq!(service.status(), Some(403));
        assert_eq!(service.to_string(), "Service error (AccessDenied): forbidden");

        let request = S3ClientError::RequestError("connection refused".into());
        assert_eq!(request.status(), None);
    }
}
