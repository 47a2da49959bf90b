use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::InstallError;
use super::descriptor::{TentacleCategory, TentacleDescriptor, VersionConstraint};

pub const METADATA_FILE: &str = "metadata.json";
const REQUIREMENT_VERSION_SEP: &str = "==";

/// Source of the tentacle descriptors available for one install run.
#[async_trait::async_trait]
pub trait DescriptorStore: Send + Sync {
    async fn load_descriptors(&self) -> Result<Vec<TentacleDescriptor>, InstallError>;
}

/// `metadata.json` shipped at the root of each tentacle directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TentacleMetadata {
    pub version: String,
    pub origin_package: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tentacles: Vec<String>,
    #[serde(
        default,
        rename = "tentacles-requirements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub requirements: Vec<String>,
}

impl TentacleMetadata {
    pub async fn load(tentacle_dir: &Path) -> Result<Self, InstallError> {
        let path = tentacle_dir.join(METADATA_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| InstallError::Metadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|e| InstallError::Metadata {
            path,
            reason: e.to_string(),
        })
    }

    /// Parses `"name"` and `"name==version"` entries.
    pub fn parsed_requirements(&self) -> BTreeMap<String, VersionConstraint> {
        self.requirements
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| match r.split_once(REQUIREMENT_VERSION_SEP) {
                Some((name, version)) => (
                    name.trim().to_string(),
                    VersionConstraint::from(Some(version.to_string())),
                ),
                None => (r.trim().to_string(), VersionConstraint::Any),
            })
            .collect()
    }
}

/// Discovers tentacles from a reference tree laid out as
/// `<root>/<Category>/[<group>/]<tentacle>/metadata.json`.
#[derive(Debug, Clone)]
pub struct MetadataDiscovery {
    reference_root: PathBuf,
}

impl MetadataDiscovery {
    pub fn new(reference_root: impl Into<PathBuf>) -> Self {
        Self {
            reference_root: reference_root.into(),
        }
    }

    pub fn reference_root(&self) -> &Path {
        &self.reference_root
    }

    pub async fn discover(&self) -> Result<Vec<TentacleDescriptor>, InstallError> {
        let mut descriptors = Vec::new();

        for category in TentacleCategory::ALL {
            let category_dir = self.reference_root.join(category.folder_name());
            if !category_dir.is_dir() {
                continue;
            }

            for child in sub_directories(&category_dir).await? {
                if is_tentacle_dir(&child) {
                    descriptors.push(Self::load_descriptor(category, child).await?);
                    continue;
                }
                for grandchild in sub_directories(&child).await? {
                    if is_tentacle_dir(&grandchild) {
                        descriptors.push(Self::load_descriptor(category, grandchild).await?);
                    }
                }
            }
        }

        Self::validate(&descriptors)?;
        Ok(descriptors)
    }

    async fn load_descriptor(
        category: TentacleCategory,
        dir: PathBuf,
    ) -> Result<TentacleDescriptor, InstallError> {
        let metadata = TentacleMetadata::load(&dir).await?;
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| InstallError::Metadata {
                path: dir.clone(),
                reason: "tentacle directory name is not valid UTF-8".into(),
            })?;

        Ok(TentacleDescriptor {
            name,
            category,
            requirements: metadata.parsed_requirements(),
            version: metadata.version,
            origin: metadata.origin_package,
            source_path: dir,
        })
    }

    fn validate(descriptors: &[TentacleDescriptor]) -> Result<(), InstallError> {
        let mut seen: HashMap<&str, &PathBuf> = HashMap::new();
        for descriptor in descriptors {
            if let Some(first) = seen.get(descriptor.name.as_str()) {
                return Err(InstallError::DuplicateTentacle {
                    name: descriptor.name.clone(),
                    first: (*first).clone(),
                    second: descriptor.source_path.clone(),
                });
            }
            seen.insert(&descriptor.name, &descriptor.source_path);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DescriptorStore for MetadataDiscovery {
    async fn load_descriptors(&self) -> Result<Vec<TentacleDescriptor>, InstallError> {
        self.discover().await
    }
}

/// Fixed descriptor list, for hosts that discover tentacles themselves.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    descriptors: Vec<TentacleDescriptor>,
}

impl InMemoryStore {
    pub fn new(descriptors: Vec<TentacleDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait::async_trait]
impl DescriptorStore for InMemoryStore {
    async fn load_descriptors(&self) -> Result<Vec<TentacleDescriptor>, InstallError> {
        Ok(self.descriptors.clone())
    }
}

fn is_tentacle_dir(dir: &Path) -> bool {
    dir.join(METADATA_FILE).is_file()
}

async fn sub_directories(dir: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| InstallError::io("read directory", dir, e))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| InstallError::io("read directory entry in", dir, e))?
    {
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
