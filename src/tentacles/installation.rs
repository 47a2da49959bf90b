use std::path::{Path, PathBuf};

use super::InstallError;
use super::descriptor::{TentacleCategory, TentacleDescriptor};
use super::discovery::{METADATA_FILE, TentacleMetadata};

/// Folder at the installation root receiving imported tentacle configs.
pub const SPECIFIC_CONFIG_FOLDER: &str = "specific_config";

/// An installed tentacle as recorded on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTentacle {
    pub name: String,
    pub category: TentacleCategory,
    pub version: String,
    pub origin: String,
}

/// The active tentacle tree: `<root>/<Category>/<tentacle>/...`.
#[derive(Debug, Clone)]
pub struct ActiveInstallation {
    root: PathBuf,
}

impl ActiveInstallation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: TentacleCategory) -> PathBuf {
        self.root.join(category.folder_name())
    }

    pub fn tentacle_dir(&self, descriptor: &TentacleDescriptor) -> PathBuf {
        self.category_dir(descriptor.category).join(&descriptor.name)
    }

    pub fn specific_config_dir(&self) -> PathBuf {
        self.root.join(SPECIFIC_CONFIG_FOLDER)
    }

    /// Creates the root and every category folder that is missing.
    pub async fn ensure_structure(&self) -> Result<(), InstallError> {
        for category in TentacleCategory::ALL {
            let dir = self.category_dir(category);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| InstallError::io("create directory", &dir, e))?;
        }
        Ok(())
    }

    /// Version recorded in the installed `metadata.json` of `name`, if any
    /// category holds a tentacle with that name.
    pub async fn installed_version(&self, name: &str) -> Option<String> {
        for category in TentacleCategory::ALL {
            let dir = self.category_dir(category).join(name);
            if !dir.join(METADATA_FILE).is_file() {
                continue;
            }
            match TentacleMetadata::load(&dir).await {
                Ok(metadata) => return Some(metadata.version),
                Err(e) => {
                    tracing::warn!(
                        tentacle = name,
                        error = %e,
                        "Ignoring unreadable installed metadata"
                    );
                }
            }
        }
        None
    }

    /// Every tentacle folder carrying readable metadata, sorted by category then name.
    pub async fn installed_tentacles(&self) -> Result<Vec<InstalledTentacle>, InstallError> {
        let mut installed = Vec::new();

        for category in TentacleCategory::ALL {
            let category_dir = self.category_dir(category);
            if !category_dir.is_dir() {
                continue;
            }

            let mut entries = tokio::fs::read_dir(&category_dir)
                .await
                .map_err(|e| InstallError::io("read directory", &category_dir, e))?;
            let mut found = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| InstallError::io("read directory entry in", &category_dir, e))?
            {
                let path = entry.path();
                if !path.join(METADATA_FILE).is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                match TentacleMetadata::load(&path).await {
                    Ok(metadata) => found.push(InstalledTentacle {
                        name: name.to_string(),
                        category,
                        version: metadata.version,
                        origin: metadata.origin_package,
                    }),
                    Err(e) => tracing::warn!(error = %e, "Skipping installed tentacle"),
                }
            }
            found.sort_by(|a, b| a.name.cmp(&b.name));
            installed.extend(found);
        }

        Ok(installed)
    }
}
