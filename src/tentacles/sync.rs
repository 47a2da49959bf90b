//! Payload synchronization from the reference tree into the installation.
//!
//! Partial copies are not rolled back: an error half-way through leaves the
//! target with a mix of old and new files.

use std::path::{Path, PathBuf};

use super::InstallError;

pub const DEFAULT_MODULE_FOLDERS: &[&str] = &["resources", "tests", "config"];

/// Mirrors `source` into `target`.
///
/// Plain files overwrite their counterpart. Directories named in
/// `module_folders` replace the target directory wholesale. Any other
/// directory is local state and is left alone.
pub async fn sync_tentacle_files(
    source: &Path,
    target: &Path,
    module_folders: &[String],
) -> Result<SyncStats, InstallError> {
    tokio::fs::create_dir_all(target)
        .await
        .map_err(|e| InstallError::io("create directory", target, e))?;

    let mut stats = SyncStats::default();
    for entry in read_entries(source).await? {
        let Some(file_name) = entry.file_name() else {
            continue;
        };
        let target_entry = target.join(file_name);
        let metadata = tokio::fs::metadata(&entry)
            .await
            .map_err(|e| InstallError::io("inspect", &entry, e))?;

        if metadata.is_file() {
            copy_file(&entry, &target_entry).await?;
            stats.files += 1;
        } else if metadata.is_dir()
            && module_folders
                .iter()
                .any(|folder| file_name.to_str() == Some(folder.as_str()))
        {
            match tokio::fs::remove_dir_all(&target_entry).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(InstallError::io("remove", &target_entry, e)),
            }
            stats.files += copy_dir_all(&entry, &target_entry).await?;
            stats.module_folders += 1;
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub files: usize,
    pub module_folders: usize,
}

async fn copy_file(source: &Path, target: &Path) -> Result<(), InstallError> {
    tokio::fs::copy(source, target)
        .await
        .map(|_| ())
        .map_err(|e| InstallError::io("copy", source, e))
}

/// Copies a whole directory tree, returning the number of files written.
async fn copy_dir_all(source: &Path, target: &Path) -> Result<usize, InstallError> {
    let mut copied = 0;
    let mut pending = vec![(source.to_path_buf(), target.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        tokio::fs::create_dir_all(&to)
            .await
            .map_err(|e| InstallError::io("create directory", &to, e))?;

        for entry in read_entries(&from).await? {
            let Some(file_name) = entry.file_name() else {
                continue;
            };
            let dest = to.join(file_name);
            let metadata = tokio::fs::metadata(&entry)
                .await
                .map_err(|e| InstallError::io("inspect", &entry, e))?;
            if metadata.is_dir() {
                pending.push((entry, dest));
            } else {
                copy_file(&entry, &dest).await?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}

async fn read_entries(dir: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| InstallError::io("read directory", dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| InstallError::io("read directory entry in", dir, e))?
    {
        paths.push(entry.path());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn module_folders() -> Vec<String> {
        DEFAULT_MODULE_FOLDERS.iter().map(|s| s.to_string()).collect()
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_copies_plain_files_and_overwrites() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ref");
        let target = dir.path().join("active");
        write(&source.join("evaluator.py"), "new");
        write(&target.join("evaluator.py"), "old");
        write(&target.join("local.txt"), "kept");

        let stats = sync_tentacle_files(&source, &target, &module_folders())
            .await
            .unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(std::fs::read_to_string(target.join("evaluator.py")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(target.join("local.txt")).unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_module_folder_replaced_wholesale() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ref");
        let target = dir.path().join("active");
        write(&source.join("resources").join("nested").join("doc.md"), "fresh");
        write(&target.join("resources").join("stale.md"), "stale");

        let stats = sync_tentacle_files(&source, &target, &module_folders())
            .await
            .unwrap();
        assert_eq!(stats.module_folders, 1);
        assert!(!target.join("resources").join("stale.md").exists());
        assert_eq!(
            std::fs::read_to_string(target.join("resources").join("nested").join("doc.md")).unwrap(),
            "fresh"
        );
    }

    #[tokio::test]
    async fn test_other_directories_not_copied() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ref");
        let target = dir.path().join("active");
        write(&source.join("__pycache__").join("cached.pyc"), "bytes");
        write(&source.join("main.py"), "code");

        sync_tentacle_files(&source, &target, &module_folders())
            .await
            .unwrap();
        assert!(target.join("main.py").exists());
        assert!(!target.join("__pycache__").exists());
    }

    #[tokio::test]
    async fn test_unremovable_module_folder_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("ref");
        let target = dir.path().join("active");
        write(&source.join("tests").join("test_rsi.py"), "fresh");
        write(&target.join("tests"), "a file where the folder should be");

        let err = sync_tentacle_files(&source, &target, &module_folders())
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Io { action: "remove", .. }));
        assert_eq!(
            std::fs::read_to_string(target.join("tests")).unwrap(),
            "a file where the folder should be"
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let dir = tempdir().unwrap();
        let err = sync_tentacle_files(
            &dir.path().join("missing"),
            &dir.path().join("active"),
            &module_folders(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InstallError::Io { .. }));
    }
}
