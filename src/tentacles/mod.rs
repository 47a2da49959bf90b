//! Tentacle installation.
//!
//! Tentacles are directories in a reference tree, grouped by category, each
//! with a `metadata.json` describing its version, origin package and the
//! tentacles it requires. Installing copies them into the active tree and
//! generates the loader files the host imports.
//!
//! # Directory Structure
//!
//! ```text
//! tentacles/
//! ├── tentacles_config.json
//! ├── specific_config/           # user copies of tentacle default configs
//! ├── Evaluator/
//! │   ├── __init__.py            # aggregate: one activation line per tentacle
//! │   └── rsi_evaluator/
//! │       ├── __init__.py        # guarded loader
//! │       ├── metadata.json
//! │       ├── rsi_evaluator.py
//! │       ├── resources/         # replaced wholesale on install
//! │       ├── tests/             # replaced wholesale on install
//! │       └── config/            # replaced wholesale, imported if new
//! └── Trading/
//!     └── ...
//! ```
//!
//! Installing a tentacle never aborts the batch: each failure is collected
//! with the tentacle name and its cause, and the batch reports the count.
//! A tentacle that fails half-way through copying keeps whatever files were
//! already written; there is no rollback.

mod descriptor;
mod discovery;
mod error;
mod installation;
mod installer;
mod refresh;
pub mod requirements;
mod run;
mod shim;
pub mod sync;
pub mod user_config;

pub use descriptor::{TentacleCategory, TentacleDescriptor, VersionConstraint};
pub use discovery::{
    DescriptorStore, InMemoryStore, METADATA_FILE, MetadataDiscovery, TentacleMetadata,
};
pub use error::{InstallError, InstallFailure};
pub use installation::{ActiveInstallation, InstalledTentacle, SPECIFIC_CONFIG_FOLDER};
pub use installer::{MAX_REQUIREMENT_DEPTH, SETUP_SCOPE, TentacleInstaller};
pub use refresh::{
    ConfigRefresher, InstallationContext, NoopRefresher, TENTACLES_CONFIG_FILE, TentaclesConfig,
    TentaclesConfigFile,
};
pub use run::{InstallReport, InstallRun};
pub use shim::{ShimTemplate, ShimWriter};
pub use sync::{DEFAULT_MODULE_FOLDERS, SyncStats};
