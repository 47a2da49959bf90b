//! # tentacles-manager
//!
//! Installs tentacle plugins from a reference tree into the active tentacle
//! directory of a host application.
//!
//! Requirements are installed before the tentacles that declare them, payloads
//! are mirrored with module folders replaced wholesale, and every installed
//! tentacle gets a loader shim that activates it only when the host's
//! compatibility check accepts it. A failing tentacle is reported, never fatal
//! to the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tentacles_manager::{InstallerConfig, TentacleInstaller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tentacles_manager::Error> {
//!     let config = InstallerConfig::load("tentacles_installer.json")
//!         .await?
//!         .with_env_overrides()?;
//!     let installer = TentacleInstaller::from_config(&config);
//!
//!     let report = installer.install(None).await;
//!     for message in report.error_messages() {
//!         eprintln!("{}", message);
//!     }
//!     println!("{} failure(s)", report.failure_count());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod tentacles;

pub use config::{ConfigError, InstallerConfig};
pub use tentacles::{
    ActiveInstallation, ConfigRefresher, DescriptorStore, InMemoryStore, InstallError,
    InstallFailure, InstallReport, MetadataDiscovery, NoopRefresher, ShimTemplate,
    TentacleCategory, TentacleDescriptor, TentacleInstaller, TentaclesConfigFile,
    VersionConstraint,
};

/// Error type for tentacles-manager operations.
///
/// Installing tentacles does not return this: per-tentacle failures are
/// collected in the [`InstallReport`]. It covers the setup around a run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Discovery or installation step failed.
    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tentacles-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
