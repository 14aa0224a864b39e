//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    ///
    /// # Returns
    /// The loaded config (all None if the file doesn't exist)
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Save configuration to storage, replacing the previous file.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the configuration file
    fn path(&self) -> PathBuf;

    /// Check if the configuration file exists
    fn exists(&self) -> bool;

    /// Write a configuration file with defaults.
    /// Fails with `AlreadyExists` if one is present.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Default recording directory when none is configured
    fn default_output_dir(&self) -> PathBuf;
}
