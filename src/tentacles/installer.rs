use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tracing::{Instrument, debug, info, warn};

use super::descriptor::TentacleDescriptor;
use super::discovery::{DescriptorStore, MetadataDiscovery};
use super::error::{InstallError, InstallFailure};
use super::installation::ActiveInstallation;
use super::refresh::{ConfigRefresher, TentaclesConfigFile};
use super::requirements::resolve_requirements;
use super::run::{InstallReport, InstallRun};
use super::shim::{ShimTemplate, ShimWriter};
use super::sync::{DEFAULT_MODULE_FOLDERS, sync_tentacle_files};
use super::user_config::import_tentacle_config;
use crate::config::InstallerConfig;

/// Deepest chain of requirement installs started from one candidate.
pub const MAX_REQUIREMENT_DEPTH: usize = 32;

/// Name under which failures that happen before any tentacle is touched are recorded.
pub const SETUP_SCOPE: &str = "tentacles setup";

/// Installs tentacles from a descriptor store into an active installation.
pub struct TentacleInstaller {
    installation: ActiveInstallation,
    store: Arc<dyn DescriptorStore>,
    refresher: Arc<dyn ConfigRefresher>,
    shims: ShimWriter,
    module_folders: Vec<String>,
    max_concurrency: Option<usize>,
}

impl TentacleInstaller {
    pub fn new(installation_root: impl Into<PathBuf>, store: Arc<dyn DescriptorStore>) -> Self {
        Self {
            installation: ActiveInstallation::new(installation_root),
            store,
            refresher: Arc::new(TentaclesConfigFile::new()),
            shims: ShimWriter::default(),
            module_folders: DEFAULT_MODULE_FOLDERS.iter().map(|s| s.to_string()).collect(),
            max_concurrency: None,
        }
    }

    /// Installer reading descriptors from `config.reference_root`.
    pub fn from_config(config: &InstallerConfig) -> Self {
        let store = Arc::new(MetadataDiscovery::new(&config.reference_root));
        let mut installer = Self::new(&config.installation_root, store)
            .with_template(config.shim.clone())
            .with_module_folders(config.module_folders.clone());
        installer.max_concurrency = config.max_concurrency.map(|limit| limit.max(1));
        installer
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn ConfigRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn with_template(mut self, template: ShimTemplate) -> Self {
        self.shims = ShimWriter::new(template);
        self
    }

    pub fn with_module_folders(mut self, folders: Vec<String>) -> Self {
        self.module_folders = folders;
        self
    }

    /// Caps how many candidate installs run at once; `0` is treated as `1`.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn installation(&self) -> &ActiveInstallation {
        &self.installation
    }

    /// Installs every tentacle, or only those named in `name_filter`, and
    /// returns the number of failures. Never fails as a whole.
    pub async fn install_tentacles(&self, name_filter: Option<&HashSet<String>>) -> usize {
        self.install(name_filter).await.failure_count()
    }

    pub async fn install(&self, name_filter: Option<&HashSet<String>>) -> InstallReport {
        let run = InstallRun::new();
        let span = tracing::info_span!("install_tentacles", run_id = %run.id());
        self.run_batch(&run, name_filter).instrument(span).await;
        run.into_report()
    }

    async fn run_batch(&self, run: &InstallRun, name_filter: Option<&HashSet<String>>) {
        match self.prepare().await {
            Ok(snapshot) => {
                let candidates: Vec<&TentacleDescriptor> = snapshot
                    .iter()
                    .filter(|d| name_filter.is_none_or(|names| names.contains(&d.name)))
                    .collect();
                if let Some(names) = name_filter {
                    for name in names {
                        if TentacleDescriptor::find(&snapshot, name).is_none() {
                            warn!(tentacle = %name, "Requested tentacle not found");
                        }
                    }
                }

                run.set_total_steps(candidates.len());
                debug!(
                    candidates = ?candidates.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
                    "Tentacles to install"
                );

                let tasks = candidates
                    .into_iter()
                    .map(|descriptor| self.install_one(descriptor, &snapshot, run, 0));
                match self.max_concurrency {
                    Some(limit) => {
                        futures::stream::iter(tasks)
                            .buffer_unordered(limit)
                            .collect::<Vec<()>>()
                            .await;
                    }
                    None => {
                        futures::future::join_all(tasks).await;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Tentacles installation could not start");
                run.record_failure(InstallFailure::new(SETUP_SCOPE, e)).await;
            }
        }

        if let Err(e) = self.refresher.refresh(&self.installation).await {
            warn!(error = %e, "Failed to refresh tentacles configuration");
        }

        self.log_summary(run).await;
    }

    async fn prepare(&self) -> Result<Vec<TentacleDescriptor>, InstallError> {
        self.installation.ensure_structure().await?;
        self.store.load_descriptors().await
    }

    /// Installs one tentacle after its missing requirements; failures are
    /// recorded on the run instead of returned.
    fn install_one<'a>(
        &'a self,
        descriptor: &'a TentacleDescriptor,
        snapshot: &'a [TentacleDescriptor],
        run: &'a InstallRun,
        depth: usize,
    ) -> BoxFuture<'a, ()> {
        async move {
            if run.try_claim(&descriptor.name) {
                match self.install_sequence(descriptor, snapshot, run, depth).await {
                    Ok(()) => {
                        info!(
                            "[{}/{}] installed {}",
                            run.progress(),
                            run.total_steps(),
                            descriptor
                        );
                        run.record_installed(&descriptor.name).await;
                    }
                    Err(error) => {
                        let failure = InstallFailure::new(&descriptor.name, error);
                        warn!(tentacle = %descriptor.name, "{}", failure);
                        run.record_failure(failure).await;
                    }
                }
            } else {
                debug!(tentacle = %descriptor.name, "Already processed in this run");
            }
            run.advance();
        }
        .boxed()
    }

    async fn install_sequence(
        &self,
        descriptor: &TentacleDescriptor,
        snapshot: &[TentacleDescriptor],
        run: &InstallRun,
        depth: usize,
    ) -> Result<(), InstallError> {
        for requirement in resolve_requirements(descriptor, &self.installation, snapshot).await? {
            if run.is_processed(&requirement.name) {
                debug!(
                    tentacle = %descriptor.name,
                    requirement = %requirement.name,
                    "Requirement already claimed in this run"
                );
                continue;
            }
            if depth + 1 > MAX_REQUIREMENT_DEPTH {
                return Err(InstallError::RequirementDepthExceeded {
                    tentacle: descriptor.name.clone(),
                    max: MAX_REQUIREMENT_DEPTH,
                });
            }
            debug!(
                tentacle = %descriptor.name,
                requirement = %requirement.name,
                "Installing requirement"
            );
            self.install_one(requirement, snapshot, run, depth + 1).await;
        }

        let tentacle_dir = self.installation.tentacle_dir(descriptor);
        let stats =
            sync_tentacle_files(descriptor.source_path(), &tentacle_dir, &self.module_folders)
                .await?;
        debug!(
            tentacle = %descriptor.name,
            files = stats.files,
            module_folders = stats.module_folders,
            "Synchronized tentacle files"
        );
        self.shims
            .update_aggregate_file(descriptor, &self.installation.category_dir(descriptor.category))
            .await?;
        self.shims.write_loader_file(descriptor, &tentacle_dir).await?;

        let imported =
            import_tentacle_config(&tentacle_dir, &self.installation.specific_config_dir()).await?;
        if !imported.is_empty() {
            debug!(tentacle = %descriptor.name, files = ?imported, "Imported tentacle config");
        }
        Ok(())
    }

    async fn log_summary(&self, run: &InstallRun) {
        let failures = run.failure_count().await;
        if failures == 0 {
            info!(total = run.total_steps(), "All tentacles installed");
        } else {
            warn!(
                total = run.total_steps(),
                failures,
                "Tentacles installation finished with errors"
            );
        }
    }
}
