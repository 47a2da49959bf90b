//! Requirement resolution against the active installation.

use super::InstallError;
use super::descriptor::{TentacleDescriptor, VersionConstraint};
use super::installation::ActiveInstallation;

/// Requirements of `descriptor` with no compatible version installed, sorted
/// by requirement name.
pub async fn missing_requirements<'a>(
    descriptor: &'a TentacleDescriptor,
    installation: &ActiveInstallation,
) -> Vec<(&'a str, &'a VersionConstraint)> {
    let mut missing = Vec::new();
    for (name, constraint) in &descriptor.requirements {
        let satisfied = installation
            .installed_version(name)
            .await
            .is_some_and(|installed| constraint.is_satisfied_by(&installed));
        if !satisfied {
            missing.push((name.as_str(), constraint));
        }
    }
    missing
}

/// Descriptors to install before `descriptor`, looked up by name in the full
/// snapshot of the run.
///
/// Fails with [`InstallError::MissingRequirement`] if any missing requirement
/// has no descriptor, before anything gets installed.
pub async fn resolve_requirements<'s>(
    descriptor: &TentacleDescriptor,
    installation: &ActiveInstallation,
    snapshot: &'s [TentacleDescriptor],
) -> Result<Vec<&'s TentacleDescriptor>, InstallError> {
    let missing = missing_requirements(descriptor, installation).await;
    let mut to_install = Vec::with_capacity(missing.len());

    for (name, constraint) in missing {
        let Some(found) = TentacleDescriptor::find(snapshot, name) else {
            return Err(InstallError::MissingRequirement {
                requirement: name.to_string(),
                required_by: descriptor.name.clone(),
            });
        };
        if !constraint.is_satisfied_by(&found.version) {
            tracing::warn!(
                tentacle = %descriptor.name,
                requirement = name,
                required = %constraint,
                available = %found.version,
                "Installing requirement with a different version than declared"
            );
        }
        to_install.push(found);
    }

    Ok(to_install)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tentacles::descriptor::TentacleCategory;
    use crate::tentacles::discovery::METADATA_FILE;
    use tempfile::tempdir;

    fn descriptor(name: &str) -> TentacleDescriptor {
        TentacleDescriptor::new(name, TentacleCategory::Evaluator, "/ref", "1.0.0", "pkg")
    }

    fn install_metadata(root: &std::path::Path, name: &str, version: &str) {
        let dir = root.join("Evaluator").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(METADATA_FILE),
            format!(r#"{{"version":"{}","origin_package":"pkg"}}"#, version),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_requirements() {
        let dir = tempdir().unwrap();
        install_metadata(dir.path(), "installed_any", "0.1.0");
        install_metadata(dir.path(), "installed_old", "1.0.0");
        install_metadata(dir.path(), "installed_exact", "2.0.0");

        let dependent = descriptor("dependent")
            .with_requirement("installed_any", VersionConstraint::Any)
            .with_requirement("installed_old", VersionConstraint::exact("1.1.0"))
            .with_requirement("installed_exact", VersionConstraint::exact("2.0.0"))
            .with_requirement("absent", VersionConstraint::Any);

        let installation = ActiveInstallation::new(dir.path());
        let missing = missing_requirements(&dependent, &installation).await;
        let names: Vec<&str> = missing.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["absent", "installed_old"]);
    }

    #[tokio::test]
    async fn test_resolve_from_full_snapshot() {
        let dir = tempdir().unwrap();
        let dependent = descriptor("dependent").with_requirement("dep", VersionConstraint::Any);
        let snapshot = vec![descriptor("dep"), descriptor("dependent")];

        let installation = ActiveInstallation::new(dir.path());
        let resolved = resolve_requirements(&dependent, &installation, &snapshot)
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "dep");
    }

    #[tokio::test]
    async fn test_resolve_missing_descriptor() {
        let dir = tempdir().unwrap();
        let dependent = descriptor("A").with_requirement("C", VersionConstraint::Any);

        let installation = ActiveInstallation::new(dir.path());
        let err = resolve_requirements(&dependent, &installation, &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::MissingRequirement { ref requirement, ref required_by }
                if requirement == "C" && required_by == "A"
        ));
    }

    #[tokio::test]
    async fn test_resolve_nothing_when_satisfied() {
        let dir = tempdir().unwrap();
        install_metadata(dir.path(), "dep", "1.0.0");
        let dependent = descriptor("dependent").with_requirement("dep", VersionConstraint::exact("1.0.0"));

        let installation = ActiveInstallation::new(dir.path());
        let resolved = resolve_requirements(&dependent, &installation, &[])
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }
}
