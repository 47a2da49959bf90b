use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fixed classification of a tentacle; decides its folder in the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TentacleCategory {
    Backtesting,
    Evaluator,
    Services,
    Trading,
}

impl TentacleCategory {
    pub const ALL: [TentacleCategory; 4] = [
        TentacleCategory::Backtesting,
        TentacleCategory::Evaluator,
        TentacleCategory::Services,
        TentacleCategory::Trading,
    ];

    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Backtesting => "Backtesting",
            Self::Evaluator => "Evaluator",
            Self::Services => "Services",
            Self::Trading => "Trading",
        }
    }

    pub fn from_folder_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.folder_name() == name)
    }
}

impl fmt::Display for TentacleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Version accepted for a required tentacle.
///
/// `null`, `""` and `"*"` all mean any installed version is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum VersionConstraint {
    #[default]
    Any,
    Exact(String),
}

impl VersionConstraint {
    pub fn exact(version: impl Into<String>) -> Self {
        Self::from(Some(version.into()))
    }

    pub fn is_satisfied_by(&self, installed: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(required) => normalize_version(required) == normalize_version(installed),
        }
    }
}

fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    let version = version.strip_prefix('=').unwrap_or(version);
    version.strip_prefix('v').unwrap_or(version).trim()
}

impl From<Option<String>> for VersionConstraint {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() && v.trim() != "*" => Self::Exact(v.trim().to_string()),
            _ => Self::Any,
        }
    }
}

impl From<VersionConstraint> for Option<String> {
    fn from(value: VersionConstraint) -> Self {
        match value {
            VersionConstraint::Any => None,
            VersionConstraint::Exact(v) => Some(v),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(v) => f.write_str(v),
        }
    }
}

/// Identity and provenance of one installable tentacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TentacleDescriptor {
    pub name: String,
    pub category: TentacleCategory,
    /// Directory holding the reference payload of this tentacle.
    pub source_path: PathBuf,
    pub version: String,
    pub origin: String,
    #[serde(default)]
    pub requirements: BTreeMap<String, VersionConstraint>,
}

impl TentacleDescriptor {
    pub fn new(
        name: impl Into<String>,
        category: TentacleCategory,
        source_path: impl Into<PathBuf>,
        version: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            source_path: source_path.into(),
            version: version.into(),
            origin: origin.into(),
            requirements: BTreeMap::new(),
        }
    }

    pub fn with_requirement(
        mut self,
        name: impl Into<String>,
        constraint: VersionConstraint,
    ) -> Self {
        self.requirements.insert(name.into(), constraint);
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn find<'a>(
        descriptors: &'a [TentacleDescriptor],
        name: &str,
    ) -> Option<&'a TentacleDescriptor> {
        descriptors.iter().find(|d| d.name == name)
    }
}

impl fmt::Display for TentacleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {} ({})", self.name, self.category, self.version, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_folder_names() {
        for category in TentacleCategory::ALL {
            assert_eq!(
                TentacleCategory::from_folder_name(category.folder_name()),
                Some(category)
            );
        }
        assert_eq!(TentacleCategory::from_folder_name("Unknown"), None);
        assert_eq!(TentacleCategory::Evaluator.to_string(), "Evaluator");
    }

    #[test]
    fn test_constraint_from_option() {
        assert_eq!(VersionConstraint::from(None), VersionConstraint::Any);
        assert_eq!(VersionConstraint::from(Some("".into())), VersionConstraint::Any);
        assert_eq!(VersionConstraint::from(Some("*".into())), VersionConstraint::Any);
        assert_eq!(
            VersionConstraint::from(Some(" 1.2.0 ".into())),
            VersionConstraint::Exact("1.2.0".into())
        );
    }

    #[test]
    fn test_constraint_satisfaction() {
        assert!(VersionConstraint::Any.is_satisfied_by("0.0.1"));
        let exact = VersionConstraint::exact("1.2.0");
        assert!(exact.is_satisfied_by("1.2.0"));
        assert!(exact.is_satisfied_by("v1.2.0"));
        assert!(VersionConstraint::exact("=1.2.0").is_satisfied_by("1.2.0"));
        assert!(!exact.is_satisfied_by("1.2.1"));
    }

    #[test]
    fn test_descriptor_serde() {
        let json = r#"{
            "name": "daily_trading_mode",
            "category": "Trading",
            "source_path": "/ref/Trading/daily_trading_mode",
            "version": "1.2.0",
            "origin": "OctoBot-Default-Tentacles",
            "requirements": {"rsi_evaluator": null, "macd_evaluator": "1.0.0"}
        }"#;
        let descriptor: TentacleDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.category, TentacleCategory::Trading);
        assert_eq!(descriptor.requirements["rsi_evaluator"], VersionConstraint::Any);
        assert_eq!(
            descriptor.requirements["macd_evaluator"],
            VersionConstraint::Exact("1.0.0".into())
        );
    }

    #[test]
    fn test_find() {
        let descriptors = vec![
            TentacleDescriptor::new("a", TentacleCategory::Evaluator, "/ref/a", "1.0.0", "pkg"),
            TentacleDescriptor::new("b", TentacleCategory::Trading, "/ref/b", "1.0.0", "pkg"),
        ];
        assert_eq!(TentacleDescriptor::find(&descriptors, "b").unwrap().name, "b");
        assert!(TentacleDescriptor::find(&descriptors, "c").is_none());
    }
}
