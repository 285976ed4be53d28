//! Upload request
//!
//! Pairs a local file path with the object key it is stored under. The key
//! is always the final path segment and cannot be set independently.

use std::path::{Path, PathBuf};

/// A local file and the object key derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    local_path: PathBuf,
    object_key: String,
}

impl UploadRequest {
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        let local_path = local_path.into();
        let object_key = object_key_for(&local_path);
        Self {
            local_path,
            object_key,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Object key, empty when the path has no final segment (`/`, `..`)
    pub fn object_key(&self) -> &str {
        &self.object_key
    }
}

/// Final segment of `path`, lossily converted to UTF-8
pub fn object_key_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
