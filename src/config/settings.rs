use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::env::EnvOverrides;
use super::{ConfigError, ConfigResult, ValidationErrors};
use crate::tentacles::{DEFAULT_MODULE_FOLDERS, ShimTemplate};

/// Settings for a [`TentacleInstaller`](crate::TentacleInstaller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Active tentacle tree imported by the host.
    pub installation_root: PathBuf,
    /// Reference tree tentacles are installed from.
    pub reference_root: PathBuf,
    /// Payload folders replaced wholesale on every install.
    pub module_folders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    pub shim: ShimTemplate,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            installation_root: PathBuf::from("tentacles"),
            reference_root: PathBuf::from("reference_tentacles"),
            module_folders: DEFAULT_MODULE_FOLDERS.iter().map(|s| s.to_string()).collect(),
            max_concurrency: None,
            shim: ShimTemplate::default(),
        }
    }
}

impl InstallerConfig {
    /// Loads a JSON file; a missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.apply_env(&EnvOverrides::new())
    }

    pub fn apply_env(mut self, env: &EnvOverrides) -> ConfigResult<Self> {
        if let Some(root) = env.get("installation_root")? {
            self.installation_root = PathBuf::from(root);
        }
        if let Some(root) = env.get("reference_root")? {
            self.reference_root = PathBuf::from(root);
        }
        if let Some(limit) = env.get_parsed::<usize>("max_concurrency")? {
            self.max_concurrency = Some(limit);
        }
        if let Some(folders) = env.get("module_folders")? {
            self.module_folders = folders
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.installation_root == self.reference_root {
            errors.push(invalid(
                "installation_root",
                "must differ from reference_root",
            ));
        }
        if self.max_concurrency == Some(0) {
            errors.push(invalid("max_concurrency", "must be at least 1"));
        }
        for folder in &self.module_folders {
            let plain = !folder.is_empty() && !folder.contains(['/', '\\']);
            if !plain || folder == "." || folder == ".." {
                errors.push(invalid(
                    "module_folders",
                    &format!("'{}' is not a plain folder name", folder),
                ));
            }
        }
        for (key, name) in [
            ("shim.aggregate_file_name", &self.shim.aggregate_file_name),
            ("shim.loader_file_name", &self.shim.loader_file_name),
        ] {
            if name.is_empty() || name.contains(['/', '\\']) {
                errors.push(invalid(key, "must be a plain file name"));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::ValidationErrors(ValidationErrors(errors))),
        }
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
