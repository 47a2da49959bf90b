use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Can't find {requirement} tentacle required for {required_by}")]
    MissingRequirement {
        requirement: String,
        required_by: String,
    },

    #[error("Requirement chain of '{tentacle}' is deeper than {max} levels")]
    RequirementDepthExceeded { tentacle: String, max: usize },

    #[error("Invalid tentacle metadata at {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Duplicate tentacle name '{name}': first at {first}, second at {second}")]
    DuplicateTentacle {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{action} {path} failed: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration refresh failed: {0}")]
    Refresh(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl InstallError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// A tentacle whose install sequence failed, with the cause.
#[derive(Debug, thiserror::Error)]
#[error("Error when installing {tentacle}: {error}")]
pub struct InstallFailure {
    pub tentacle: String,
    #[source]
    pub error: InstallError,
}

impl InstallFailure {
    pub fn new(tentacle: impl Into<String>, error: InstallError) -> Self {
        Self {
            tentacle: tentacle.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InstallError::MissingRequirement {
            requirement: "rsi_evaluator".into(),
            required_by: "daily_trading_mode".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rsi_evaluator"));
        assert!(msg.contains("daily_trading_mode"));

        let err = InstallError::Metadata {
            path: PathBuf::from("/tentacles/Evaluator/bad/metadata.json"),
            reason: "missing version".into(),
        };
        assert!(err.to_string().contains("missing version"));

        let err = InstallError::DuplicateTentacle {
            name: "twice".into(),
            first: PathBuf::from("/ref/Evaluator/twice"),
            second: PathBuf::from("/ref/Trading/twice"),
        };
        let msg = err.to_string();
        assert!(msg.contains("twice"));
        assert!(msg.contains("Evaluator"));
        assert!(msg.contains("Trading"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = InstallError::io(
            "copy",
            "/target/file.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("copy"));
        assert!(msg.contains("/target/file.py"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_failure_display_names_tentacle() {
        let failure = InstallFailure::new(
            "macd_evaluator",
            InstallError::Refresh("config locked".into()),
        );
        let msg = failure.to_string();
        assert!(msg.starts_with("Error when installing macd_evaluator"));
        assert!(msg.contains("config locked"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: InstallError = json_err.into();
        assert!(matches!(err, InstallError::Json(_)));
    }
}
