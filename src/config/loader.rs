//! Configuration loader for environment variables, `.env` settings files and
//! YAML files with environment variable expansion

use super::{
    expand_env_vars, ConfigError, StoreConfig, ACCESS_KEY_ID_VAR, BUCKET_NAME_VAR,
    ENDPOINT_URL_VAR, SECRET_KEY_VAR,
};
use std::path::{Path, PathBuf};

/// Optional environment variables read next to the four required ones
pub const REGION_VAR: &str = "REGION";
pub const FORCE_PATH_STYLE_VAR: &str = "FORCE_PATH_STYLE";

const KNOWN_VARS: [&str; 6] = [
    ENDPOINT_URL_VAR,
    ACCESS_KEY_ID_VAR,
    SECRET_KEY_VAR,
    BUCKET_NAME_VAR,
    REGION_VAR,
    FORCE_PATH_STYLE_VAR,
];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file, expanding `${VAR}` and
    /// `${VAR:-default}` placeholders first.
    ///
    /// A placeholder whose variable is unset and has no default leaves its
    /// setting empty, so it fails validation like an absent setting.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<StoreConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let mut config: StoreConfig = serde_yaml::from_str(&expanded)?;

        let unresolved = config.clear_unresolved_placeholders();
        if !unresolved.is_empty() {
            tracing::warn!(settings = ?unresolved, "Unresolved placeholders in config file");
        }

        Ok(config)
    }

    /// Load configuration from the process environment.
    ///
    /// The settings file is loaded first: `settings_file` when given (it must
    /// exist), otherwise a `.env` found from the working directory upwards if
    /// there is one. Variables already set in the process are not overridden.
    pub fn from_env(settings_file: Option<&Path>) -> Result<StoreConfig, ConfigError> {
        if let Some(path) = Self::load_settings_file(settings_file)? {
            tracing::debug!(path = %path.display(), "Loaded settings file");
        }

        Self::from_process_env()
    }

    /// Read the process environment as it is, without loading a settings file
    pub fn from_process_env() -> Result<StoreConfig, ConfigError> {
        let vars = std::env::vars().filter(|(key, _)| KNOWN_VARS.contains(&key.as_str()));
        Self::from_source(vars)
    }

    /// Build configuration from explicit `NAME=value` pairs using the same
    /// names as the process environment. Unknown names are ignored.
    pub fn from_source<I, K, V>(vars: I) -> Result<StoreConfig, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: ::config::Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, _)| KNOWN_VARS.contains(&key.as_str()))
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();

        let settings = ::config::Config::builder()
            .add_source(::config::Environment::default().source(Some(source)))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load a dotenv-style settings file into the process environment.
    ///
    /// Returns the path that was loaded, or `None` when no explicit file was
    /// requested and no `.env` exists.
    pub fn load_settings_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
        match path {
            Some(path) => {
                dotenvy::from_path(path)?;
                Ok(Some(path.to_path_buf()))
            }
            None => match dotenvy::dotenv() {
                Ok(found) => Ok(Some(found)),
                Err(e) if e.not_found() => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }
}
