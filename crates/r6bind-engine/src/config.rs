//! Binding configuration
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! package = "R6"
//! target_version = "2.4."
//! policy = "dynamic"
//! strict_member_partition = false
//! check_version = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classmap::ClassMapPolicy;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Binding configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Foreign package whose version is checked at bootstrap
    pub package: String,

    /// Expected version prefix of `package`
    pub target_version: String,

    /// Policy used by `wrap_class_generator`
    pub policy: ClassMapPolicy,

    /// Reject names reported both as public fields and public methods
    pub strict_member_partition: bool,

    /// Run the bootstrap version check
    pub check_version: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            package: "R6".to_string(),
            target_version: "2.4.".to_string(),
            policy: ClassMapPolicy::Dynamic,
            strict_member_partition: false,
            check_version: true,
        }
    }
}

impl BindingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BindingConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_version && self.package.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "package must be set when check_version is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
