//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MURMUR_*)
//! 2. TOML config file (if MURMUR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MURMUR_*)
/// 2. TOML config file (if MURMUR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the posts API.
    ///
    /// Set via MURMUR_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Id of the signed-in viewer, used to derive `viewer_has_liked`.
    ///
    /// Set via MURMUR_VIEWER_ID environment variable.
    /// Required only for like/unlike.
    #[serde(default)]
    pub viewer_id: Option<String>,

    /// Posts requested per page.
    ///
    /// Set via MURMUR_PAGE_SIZE environment variable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via MURMUR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via MURMUR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".into()
}

fn default_page_size() -> u32 {
    10
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "murmur/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            viewer_id: None,
            page_size: default_page_size(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered figment `load` extracts from.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MURMUR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("MURMUR_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from `figment`.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The viewer id, required before liking.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no viewer is configured.
    pub fn require_viewer_id(&self) -> Result<&str, ConfigError> {
        self.viewer_id.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "viewer_id".into(),
            hint: "Set MURMUR_VIEWER_ID environment variable".into(),
        })
    }
}
