//! Configuration module for s3-safe-upload
//!
//! Holds the store settings the uploader needs (endpoint, credentials and
//! bucket) and the loaders that read them from the process environment, an
//! optional `.env` settings file, or a YAML file with environment variable
//! expansion.
//!
//! Loading never fails because a setting is absent. Required settings default
//! to empty strings and are checked by [`StoreConfig::validate`], so the
//! uploader can report a missing setting the same way it reports every other
//! failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Environment variable holding the S3 endpoint URL
pub const ENDPOINT_URL_VAR: &str = "ENDPOINT_URL";
/// Environment variable holding the access key id
pub const ACCESS_KEY_ID_VAR: &str = "ACCESS_KEY_ID";
/// Environment variable holding the secret key
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";
/// Environment variable holding the bucket name
pub const BUCKET_NAME_VAR: &str = "BUCKET_NAME";

/// Region used when none is configured. S3-compatible stores generally
/// accept any region for SigV4 signing.
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// Environment Variable Expansion
// ============================================================================

const PLACEHOLDER_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}";

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// assert_eq!(expand_env_vars("prefix-${MY_VAR}-suffix"), "prefix-value-suffix");
/// assert_eq!(expand_env_vars("${MISSING:-default}"), "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(PLACEHOLDER_PATTERN) else {
        return s.to_string();
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Whether `s` still holds a `${VAR}` placeholder after expansion
pub(crate) fn has_unresolved_placeholder(s: &str) -> bool {
    regex_lite::Regex::new(PLACEHOLDER_PATTERN).is_ok_and(|re| re.is_match(s))
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Failed to read settings: {0}")]
    SourceError(#[from] ::config::ConfigError),

    #[error("Failed to load settings file: {0}")]
    DotenvError(#[from] dotenvy::Error),

    #[error("Missing configuration settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),
}

/// Settings for the remote object store.
///
/// Field names on the wire match the environment variables, lowercased:
/// `endpoint_url`, `access_key_id`, `secret_key`, `bucket_name`, `region`
/// and `force_path_style`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, rename = "endpoint_url")]
    pub endpoint: String,

    #[serde(default, rename = "access_key_id")]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    #[serde(default)]
    pub bucket_name: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Address buckets as `endpoint/bucket/key`. Most S3-compatible stores
    /// need this. Default: true
    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
}

impl StoreConfig {
    /// Create a config with the four required settings and default extras
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket_name: bucket_name.into(),
            region: default_region(),
            force_path_style: default_force_path_style(),
        }
    }

    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Load configuration from the process environment, after the optional
    /// `.env` settings file in the working directory
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::from_env(None)
    }

    /// Region to sign requests for, falling back to [`DEFAULT_REGION`]
    pub fn effective_region(&self) -> &str {
        if self.region.trim().is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }

    /// Names of the required settings that are empty or absent
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            (ENDPOINT_URL_VAR, &self.endpoint),
            (ACCESS_KEY_ID_VAR, &self.access_key),
            (SECRET_KEY_VAR, &self.secret_key),
            (BUCKET_NAME_VAR, &self.bucket_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Blank out settings left holding an unresolved `${VAR}` placeholder so
    /// they are reported as missing. Returns the affected variable names.
    pub(crate) fn clear_unresolved_placeholders(&mut self) -> Vec<&'static str> {
        let mut cleared = Vec::new();
        for (name, value) in [
            (ENDPOINT_URL_VAR, &mut self.endpoint),
            (ACCESS_KEY_ID_VAR, &mut self.access_key),
            (SECRET_KEY_VAR, &mut self.secret_key),
            (BUCKET_NAME_VAR, &mut self.bucket_name),
            (loader::REGION_VAR, &mut self.region),
        ] {
            if has_unresolved_placeholder(value) {
                value.clear();
                cleared.push(name);
            }
        }
        cleared
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_settings();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingSettings(missing))
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("", "", "", "")
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &secret)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_force_path_style() -> bool {
    true
}
