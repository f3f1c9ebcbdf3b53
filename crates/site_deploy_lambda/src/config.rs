use std::path::PathBuf;

use thiserror::Error;

pub const DISTRIBUTION_ID_VAR: &str = "DISTRIBUTION_ID";
pub const UPLOAD_CONCURRENCY_VAR: &str = "UPLOAD_CONCURRENCY";
pub const SCRATCH_DIR_VAR: &str = "SCRATCH_DIR";
pub const WEBHOOK_URL_VAR: &str = "SLACK_WEBHOOK_URL";

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;
const SCRATCH_SUBDIR: &str = "site-deploy";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("UPLOAD_CONCURRENCY must be a positive integer, got '{0}'")]
    InvalidConcurrency(String),
}

/// Settings read once per cold start and shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub distribution_id: Option<String>,
    pub upload_concurrency: usize,
    pub scratch_dir: PathBuf,
    pub webhook_url: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            distribution_id: None,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            scratch_dir: std::env::temp_dir().join(SCRATCH_SUBDIR),
            webhook_url: None,
        }
    }
}

impl DeployConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let upload_concurrency = match read(UPLOAD_CONCURRENCY_VAR) {
            None => DEFAULT_UPLOAD_CONCURRENCY,
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidConcurrency(raw)),
            },
        };

        let defaults = Self::default();
        Ok(Self {
            distribution_id: read(DISTRIBUTION_ID_VAR),
            upload_concurrency,
            scratch_dir: read(SCRATCH_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            webhook_url: read(WEBHOOK_URL_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name: &str| values.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = DeployConfig::from_lookup(lookup(&[])).expect("config should load");

        assert_eq!(config.distribution_id, None);
        assert_eq!(config.upload_concurrency, DEFAULT_UPLOAD_CONCURRENCY);
        assert!(config.scratch_dir.ends_with(SCRATCH_SUBDIR));
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn reads_configured_values_and_ignores_blank_ones() {
        let config = DeployConfig::from_lookup(lookup(&[
            (DISTRIBUTION_ID_VAR, "E2EXAMPLE"),
            (UPLOAD_CONCURRENCY_VAR, "4"),
            (SCRATCH_DIR_VAR, "/tmp/custom"),
            (WEBHOOK_URL_VAR, "   "),
        ]))
        .expect("config should load");

        assert_eq!(config.distribution_id.as_deref(), Some("E2EXAMPLE"));
        assert_eq!(config.upload_concurrency, 4);
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/custom"));
        assert_eq!(config.webhook_url, None);
    }

    #[test]
    fn rejects_zero_or_non_numeric_concurrency() {
        let error = DeployConfig::from_lookup(lookup(&[(UPLOAD_CONCURRENCY_VAR, "0")]))
            .expect_err("zero should be rejected");
        assert_eq!(error, ConfigError::InvalidConcurrency("0".to_string()));

        DeployConfig::from_lookup(lookup(&[(UPLOAD_CONCURRENCY_VAR, "many")]))
            .expect_err("text should be rejected");
    }
}
