//! Conditional uploader
//!
//! Each [`Uploader`] is bound to one local file and one bucket for its whole
//! lifetime. It exposes three entry points, each of which re-runs the
//! configuration and local file validation on its own:
//!
//! - [`Uploader::safely_upload`] - validate, skip if the object exists, upload
//! - [`Uploader::upload`] - validate and upload without the existence check
//! - [`Uploader::exists`] - validate and check existence only
//!
//! The boolean operations log every failure and never return an error. The
//! `*_outcome` / `*_checked` variants return the same decision with the
//! failure attached.
//!
//! # Example
//!
//! ```no_run
//! use s3_safe_upload::config::StoreConfig;
//! use s3_safe_upload::upload::Uploader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env()?;
//! let uploader = Uploader::from_config(config, "backups/report.json")?;
//!
//! if uploader.safely_upload().await {
//!     println!("uploaded");
//! }
//! # Ok(())
//! # }
//! ```

use super::{CheckErrorPolicy, ExistenceCheck, UploadError, UploadOutcome, UploadRequest};
use crate::config::StoreConfig;
use crate::s3::{ByteStream, ObjectStore, PutObjectResponse, S3ClientError, S3Store};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Uploads one local file to one bucket unless it is already there
pub struct Uploader {
    config: StoreConfig,
    request: UploadRequest,
    store: Arc<dyn ObjectStore>,
    check_error_policy: CheckErrorPolicy,
}

impl Uploader {
    /// Create an uploader over an explicit store
    pub fn new(
        config: StoreConfig,
        local_path: impl Into<PathBuf>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            request: UploadRequest::new(local_path),
            store,
            check_error_policy: CheckErrorPolicy::default(),
        }
    }

    /// Create an uploader backed by an [`S3Store`] built from `config`
    pub fn from_config(
        config: StoreConfig,
        local_path: impl Into<PathBuf>,
    ) -> Result<Self, S3ClientError> {
        let store = S3Store::new(&config)?;
        Ok(Self::new(config, local_path, Arc::new(store)))
    }

    /// Set what [`Uploader::safely_upload`] does when the existence check fails
    pub fn with_check_error_policy(mut self, policy: CheckErrorPolicy) -> Self {
        self.check_error_policy = policy;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    pub fn object_key(&self) -> &str {
        self.request.object_key()
    }

    pub fn check_error_policy(&self) -> CheckErrorPolicy {
        self.check_error_policy
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Returns false, and logs, if any required setting is empty or absent
    pub fn validate_config(&self) -> bool {
        self.check_config().is_ok()
    }

    /// Returns false, and logs the path, if the local file does not exist
    pub fn validate_local_file(&self) -> bool {
        self.check_local_file().is_ok()
    }

    fn check_config(&self) -> Result<(), UploadError> {
        self.config.validate().map_err(|e| {
            error!(error = %e, "Missing configuration settings");
            UploadError::from(e)
        })
    }

    fn check_local_file(&self) -> Result<(), UploadError> {
        let path = self.request.local_path();

        if !path.exists() {
            error!(path = %path.display(), "File not found");
            return Err(UploadError::LocalFileMissing(path.to_path_buf()));
        }

        if self.request.object_key().is_empty() {
            error!(path = %path.display(), "Cannot derive object key from path");
            return Err(UploadError::InvalidObjectKey(path.to_path_buf()));
        }

        Ok(())
    }

    fn pre_validate(&self) -> Result<(), UploadError> {
        self.check_config()?;
        self.check_local_file()
    }

    // ========================================================================
    // Existence check
    // ========================================================================

    /// Ask the store for the object without validating first
    pub async fn check_existence(&self) -> ExistenceCheck {
        match self
            .store
            .object_exists(&self.config.bucket_name, self.request.object_key())
            .await
        {
            Ok(true) => ExistenceCheck::Found,
            Ok(false) => ExistenceCheck::NotFound,
            Err(e) => ExistenceCheck::Error(e),
        }
    }

    /// Validate, then report whether the object exists.
    ///
    /// A store error is logged and reported as `false`, the same as a
    /// confirmed absence. Use [`Uploader::check_existence`] to tell them apart.
    #[tracing::instrument(
        name = "uploader.exists",
        skip(self),
        fields(s3.bucket = %self.config.bucket_name, s3.key = %self.request.object_key())
    )]
    pub async fn exists(&self) -> bool {
        if let Err(e) = self.pre_validate() {
            error!(error = %e, "Prevalidation not passed");
            return false;
        }

        match self.check_existence().await {
            ExistenceCheck::Found => true,
            ExistenceCheck::NotFound => false,
            ExistenceCheck::Error(e) => {
                error!(error = %e, "Existence check failed");
                false
            }
        }
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Validate, then upload without checking for an existing object
    pub async fn upload(&self) -> bool {
        self.upload_checked().await.is_ok()
    }

    /// [`Uploader::upload`] with the failure returned instead of flattened
    #[tracing::instrument(
        name = "uploader.upload",
        skip(self),
        fields(s3.bucket = %self.config.bucket_name, s3.key = %self.request.object_key())
    )]
    pub async fn upload_checked(&self) -> Result<PutObjectResponse, UploadError> {
        if let Err(e) = self.pre_validate() {
            error!(error = %e, "Prevalidation not passed");
            return Err(e);
        }

        self.send().await
    }

    /// Validate, skip if the object already exists, otherwise upload.
    ///
    /// Returns true only when an upload happened and succeeded.
    pub async fn safely_upload(&self) -> bool {
        self.safely_upload_outcome().await.is_uploaded()
    }

    /// [`Uploader::safely_upload`] with the skip/failure distinction kept
    #[tracing::instrument(
        name = "uploader.safely_upload",
        skip(self),
        fields(s3.bucket = %self.config.bucket_name, s3.key = %self.request.object_key())
    )]
    pub async fn safely_upload_outcome(&self) -> UploadOutcome {
        if let Err(e) = self.pre_validate() {
            return UploadOutcome::Failed(e);
        }

        match self.check_existence().await {
            ExistenceCheck::Found => {
                info!("Object already exists, skipping upload");
                return UploadOutcome::Skipped;
            }
            ExistenceCheck::NotFound => {
                info!("Object not found, uploading");
            }
            ExistenceCheck::Error(e) => match self.check_error_policy {
                CheckErrorPolicy::Proceed => {
                    error!(error = %e, "Existence check failed");
                    warn!("Uploading as if the object were absent");
                }
                CheckErrorPolicy::Abort => {
                    error!(error = %e, "Existence check failed, not uploading");
                    return UploadOutcome::Failed(UploadError::ExistenceCheck(e));
                }
            },
        }

        match self.send().await {
            Ok(response) => UploadOutcome::Uploaded(response),
            Err(e) => UploadOutcome::Failed(e),
        }
    }

    /// Stream the file to the store in a single request
    async fn send(&self) -> Result<PutObjectResponse, UploadError> {
        let path = self.request.local_path();

        let body = open_body(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to read local file");
            UploadError::Io(e)
        })?;

        match self
            .store
            .put_object(
                &self.config.bucket_name,
                self.request.object_key(),
                body,
            )
            .await
        {
            Ok(response) => {
                info!(
                    bytes_written = response.bytes_written,
                    etag = ?response.etag,
                    "Upload successful"
                );
                Ok(response)
            }
            Err(e) => {
                error!(error = %e, "Upload failed");
                Err(UploadError::Remote(e))
            }
        }
    }
}

/// Open `path` as a file-backed body. A directory exists but cannot be
/// read, so it is rejected here rather than by the store.
async fn open_body(path: &Path) -> io::Result<ByteStream> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is a directory", path.display()),
        ));
    }

    ByteStream::from_path(path).await.map_err(io::Error::other)
}
