use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a recipe context session
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    /// Upper bound on a single extraction, in seconds
    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,
    /// Re-arm the cold-start notice after this many idle seconds.
    /// Unset means the notice fires only once per session.
    #[serde(default)]
    pub cold_start_idle_secs: Option<u64>,
    /// Recipe backend settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Saved-set persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Configuration for the HTTP recipe backend
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Base URL of the recipe backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with each request (can also be set via environment variable)
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Transcript language requested from the backend
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
            language: default_language(),
        }
    }
}

/// Configuration for the saved-set key-value file
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON store; unset keeps the saved set in memory only
    pub path: Option<PathBuf>,
    /// Key the ordered saved list is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: default_extraction_timeout(),
            cold_start_idle_secs: None,
            extractor: ExtractorConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

// Default value functions
fn default_extraction_timeout() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    90
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

pub(crate) fn default_language() -> String {
    "en".to_string()
}

pub(crate) fn default_storage_key() -> String {
    "savedRecipes".to_string()
}

impl ContextConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with VIDEO_RECIPES__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: VIDEO_RECIPES__EXTRACTOR__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn cold_start_idle(&self) -> Option<Duration> {
        self.cold_start_idle_secs.map(Duration::from_secs)
    }
}

/// Load configuration from file and environment variables
///
/// See [`ContextConfig::load`] for the source priority.
pub fn load_config() -> Result<ContextConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: VIDEO_RECIPES__STORAGE__PATH
        .add_source(
            Environment::with_prefix("VIDEO_RECIPES")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
