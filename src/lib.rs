//! s3-safe-upload library
//!
//! Uploads a single local file to an S3-compatible bucket, skipping the
//! upload when an object with the same name is already there.
//!
//! # Features
//!
//! - **Idempotent**: the object key is the file's base name; an existing key is left alone
//! - **S3 Compatible**: any endpoint reachable with static credentials, path-style by default
//! - **Private Objects**: uploads always use the `private` canned ACL
//!
//! # Example
//!
//! ```no_run
//! use s3_safe_upload::{config::StoreConfig, upload::Uploader};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StoreConfig::from_env()?;
//!     let uploader = Uploader::from_config(config, "report.json")?;
//!     uploader.safely_upload().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod s3;
pub mod upload;

// Re-export commonly used types
pub use crate::config::StoreConfig;
pub use crate::upload::{UploadOutcome, Uploader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
