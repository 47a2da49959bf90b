//! Environment variable overrides for installer configuration.
//!
//! Environment variables are read, never written, at runtime.

use super::{ConfigError, ConfigResult};

pub const DEFAULT_ENV_PREFIX: &str = "TENTACLES_";

/// Read-only view over prefixed environment variables.
#[derive(Debug, Clone)]
pub struct EnvOverrides {
    prefix: String,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `installation.root` becomes `<PREFIX>INSTALLATION_ROOT`.
    pub fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }

    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    pub fn get_parsed<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key)? {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: self.env_key(key),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

impl Default for EnvOverrides {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let env = EnvOverrides::new();
        assert_eq!(env.env_key("installation_root"), "TENTACLES_INSTALLATION_ROOT");
        assert_eq!(env.env_key("shim.loader_file_name"), "TENTACLES_SHIM_LOADER_FILE_NAME");

        let env = EnvOverrides::prefixed("OCTO_");
        assert_eq!(env.env_key("max_concurrency"), "OCTO_MAX_CONCURRENCY");
    }

    #[test]
    fn test_get_and_parse() {
        let env = EnvOverrides::prefixed("TENTACLES_ENV_TEST_");

        // SAFETY: Test-only environment setup with a prefix no other test uses
        unsafe { std::env::set_var("TENTACLES_ENV_TEST_LIMIT", " 4 ") };
        assert_eq!(env.get_parsed::<usize>("limit").unwrap(), Some(4));
        unsafe { std::env::set_var("TENTACLES_ENV_TEST_LIMIT", "four") };
        assert!(matches!(
            env.get_parsed::<usize>("limit"),
            Err(ConfigError::InvalidValue { .. })
        ));
        unsafe { std::env::remove_var("TENTACLES_ENV_TEST_LIMIT") };

        assert_eq!(env.get("limit").unwrap(), None);
    }
}
