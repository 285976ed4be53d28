//! Upload module
//!
//! Validates configuration and the local file, checks whether the object is
//! already present, and uploads it when it is not.

use crate::config::ConfigError;
use crate::s3::{PutObjectResponse, S3ClientError};
use std::path::PathBuf;
use thiserror::Error;

pub mod request;
pub mod uploader;

pub use request::UploadRequest;
pub use uploader::Uploader;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error("Cannot derive an object key from path: {}", .0.display())]
    InvalidObjectKey(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    Remote(#[from] S3ClientError),

    #[error("Existence check failed: {0}")]
    ExistenceCheck(S3ClientError),
}

/// Result of asking the store whether the object is already present
#[derive(Debug)]
pub enum ExistenceCheck {
    Found,
    NotFound,
    /// The store failed with something other than "not found"; whether the
    /// object exists is unknown
    Error(S3ClientError),
}

impl ExistenceCheck {
    /// Boolean view used by [`Uploader::exists`]: unknown counts as absent
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found)
    }
}

/// What to do when the existence check fails with an error other than
/// "not found"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckErrorPolicy {
    /// Log the error and upload as if the object were absent
    #[default]
    Proceed,
    /// Log the error and give up without uploading
    Abort,
}

/// Outcome of [`Uploader::safely_upload_outcome`]
#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded(PutObjectResponse),
    /// The object already exists; nothing was sent
    Skipped,
    Failed(UploadError),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&UploadError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}
