//! Default tentacle configuration imported into the user's specific config.

use std::path::Path;

use super::InstallError;

/// Folder of an installed tentacle holding its default configuration files.
pub const TENTACLE_CONFIG_FOLDER: &str = "config";

/// Copies `<tentacle_dir>/config/*.json` into `specific_config_dir`.
///
/// A file the user already has is never overwritten. Returns the names of
/// the files that were imported.
pub async fn import_tentacle_config(
    tentacle_dir: &Path,
    specific_config_dir: &Path,
) -> Result<Vec<String>, InstallError> {
    let config_dir = tentacle_dir.join(TENTACLE_CONFIG_FOLDER);
    if !config_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(&config_dir)
        .await
        .map_err(|e| InstallError::io("read directory", &config_dir, e))?;
    let mut imported = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| InstallError::io("read directory entry in", &config_dir, e))?
    {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        let target = specific_config_dir.join(file_name);
        if tokio::fs::try_exists(&target)
            .await
            .map_err(|e| InstallError::io("inspect", &target, e))?
        {
            tracing::debug!(path = %target.display(), "Keeping existing tentacle config");
            continue;
        }

        tokio::fs::create_dir_all(specific_config_dir)
            .await
            .map_err(|e| InstallError::io("create directory", specific_config_dir, e))?;
        tokio::fs::copy(&path, &target)
            .await
            .map_err(|e| InstallError::io("copy", &path, e))?;
        imported.push(file_name.to_string_lossy().into_owned());
    }

    imported.sort();
    Ok(imported)
}
