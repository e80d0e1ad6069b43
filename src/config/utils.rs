/// Configuration utilities - loading and validation
///
/// There is no global configuration instance: callers load a [`CatalogConfig`]
/// and hand it to [`crate::CatalogService`], so tests can build as many
/// independent caches as they need.
use std::path::Path;

use super::schemas::CatalogConfig;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};

/// Largest page the provider will serve
pub const PROVIDER_MAX_PAGE_SIZE: u32 = 100;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/catalog.toml";

/// Load configuration from [`CONFIG_FILE_PATH`]
pub fn load_config() -> Result<CatalogConfig, ConfigError> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults are used and a warning is logged.
/// A file that exists but fails to parse or validate is an error.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<CatalogConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(CatalogConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    CatalogConfig::from_toml_str(&contents)
}

impl CatalogConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let page_size = self.fetcher.page_size;
        if page_size == 0 || page_size > PROVIDER_MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "fetcher.page_size".to_string(),
                reason: format!("must be between 1 and {}, got {}", PROVIDER_MAX_PAGE_SIZE, page_size),
            });
        }

        if self.loader.max_pages_per_run == 0 {
            return Err(ConfigError::InvalidValue {
                field: "loader.max_pages_per_run".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if !self.api.base_url.is_empty() {
            self.api_base_url()?;
        }

        Ok(())
    }

    /// Parsed provider base URL; required by the HTTP client only
    pub fn api_base_url(&self) -> Result<url::Url, ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "api.base_url".to_string(),
            });
        }

        url::Url::parse(self.api.base_url.trim()).map_err(|e| ConfigError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: e.to_string(),
        })
    }
}
