use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of every environment variable read by the service
pub const ENV_PREFIX: &str = "SHOPCART";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub inventory_api: InventoryApiConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

/// Remote stock and product API
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryApiConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_api_timeout")]
    pub api_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_storage_directory")]
    pub storage_directory: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    /// Load configuration from `SHOPCART_*` environment variables
    pub fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ConfigError::LoadError {
                message: format!("Failed to read environment: {}", e),
            })?;

        let config = Self::from_settings(&settings)?;
        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    /// Build and validate a configuration from an already assembled source
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        let config = Config {
            server: section(settings, "server")?,
            inventory_api: section(settings, "inventory API")?,
            storage: section(settings, "storage")?,
            observability: section(settings, "observability")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(validation_error("Server port cannot be 0"));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(validation_error("Request timeout cannot be 0"));
        }

        if self.inventory_api.api_base_url.trim().is_empty() {
            return Err(validation_error("API base URL cannot be empty"));
        }

        if self.inventory_api.api_timeout_seconds == 0 {
            return Err(validation_error("API timeout cannot be 0"));
        }

        if self.storage.storage_key.trim().is_empty() {
            return Err(validation_error("Storage key cannot be empty"));
        }

        Ok(())
    }
}

fn section<T: DeserializeOwned>(settings: &config::Config, name: &str) -> Result<T, ConfigError> {
    settings
        .clone()
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", name, e),
        })
}

fn validation_error(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl InventoryApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_api_base_url() -> String {
    "http://localhost:3333".to_string()
}

pub(crate) fn default_api_timeout() -> u64 {
    10
}

pub(crate) fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

pub(crate) fn default_storage_directory() -> PathBuf {
    PathBuf::from("./data")
}

pub(crate) fn default_storage_key() -> String {
    "shopcart:cart".to_string()
}

pub(crate) fn default_service_name() -> String {
    "shopcart-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
