//! Configuration refresh run once after each install batch.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InstallError;
use super::installation::ActiveInstallation;

pub const TENTACLES_CONFIG_FILE: &str = "tentacles_config.json";

#[async_trait::async_trait]
pub trait ConfigRefresher: Send + Sync {
    async fn refresh(&self, installation: &ActiveInstallation) -> Result<(), InstallError>;
}

/// Refresher for hosts that manage their own configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresher;

#[async_trait::async_trait]
impl ConfigRefresher for NoopRefresher {
    async fn refresh(&self, _installation: &ActiveInstallation) -> Result<(), InstallError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contents of `tentacles_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TentaclesConfig {
    #[serde(default)]
    pub installation_context: InstallationContext,
    /// Origin package -> tentacle names.
    #[serde(default)]
    pub registered_tentacles: BTreeMap<String, Vec<String>>,
    /// Category folder -> tentacle name -> activated.
    #[serde(default)]
    pub tentacle_activation: BTreeMap<String, BTreeMap<String, bool>>,
}

impl TentaclesConfig {
    pub fn is_activated(&self, category: &str, name: &str) -> Option<bool> {
        self.tentacle_activation
            .get(category)
            .and_then(|tentacles| tentacles.get(name))
            .copied()
    }
}

/// Regenerates `tentacles_config.json` at the installation root from what is
/// installed, keeping activation flags the user already set.
#[derive(Debug, Clone, Default)]
pub struct TentaclesConfigFile {
    path: Option<PathBuf>,
}

impl TentaclesConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    fn path_for(&self, installation: &ActiveInstallation) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| installation.root().join(TENTACLES_CONFIG_FILE))
    }

    pub async fn load(
        &self,
        installation: &ActiveInstallation,
    ) -> Result<TentaclesConfig, InstallError> {
        let path = self.path_for(installation);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TentaclesConfig::default()),
            Err(e) => Err(InstallError::io("read", &path, e)),
        }
    }
}

#[async_trait::async_trait]
impl ConfigRefresher for TentaclesConfigFile {
    async fn refresh(&self, installation: &ActiveInstallation) -> Result<(), InstallError> {
        let previous = self.load(installation).await?;
        let mut config = TentaclesConfig {
            installation_context: InstallationContext {
                updated_at: Some(Utc::now()),
            },
            ..Default::default()
        };

        for tentacle in installation.installed_tentacles().await? {
            let category = tentacle.category.folder_name();
            let activated = previous.is_activated(category, &tentacle.name).unwrap_or(true);
            config
                .tentacle_activation
                .entry(category.to_string())
                .or_default()
                .insert(tentacle.name.clone(), activated);
            config
                .registered_tentacles
                .entry(tentacle.origin)
                .or_default()
                .push(tentacle.name);
        }

        let path = self.path_for(installation);
        let content = serde_json::to_string_pretty(&config)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| InstallError::io("write", &path, e))?;
        tracing::debug!(path = %path.display(), "Refreshed tentacles configuration");
        Ok(())
    }
}
