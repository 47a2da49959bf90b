//! Installer configuration.
//!
//! ```rust,no_run
//! use tentacles_manager::config::InstallerConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InstallerConfig::load("tentacles_installer.json")
//!     .await?
//!     .with_env_overrides()?;
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod settings;

pub use env::{DEFAULT_ENV_PREFIX, EnvOverrides};
pub use settings::InstallerConfig;

use thiserror::Error;

/// Errors that can occur while loading installer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// Multiple validation errors
    #[error("{0}")]
    ValidationErrors(ValidationErrors),
}

#[derive(Debug)]
pub struct ValidationErrors(pub Vec<ConfigError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation failed: ")?;
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors(vec![
            ConfigError::InvalidValue {
                key: "max_concurrency".into(),
                message: "must be at least 1".into(),
            },
            ConfigError::InvalidValue {
                key: "module_folders".into(),
                message: "empty name".into(),
            },
        ]);
        let msg = errors.to_string();
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("max_concurrency"));
        assert!(msg.contains("; "));
    }
}
