use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 5;

pub const SKIP_UPDATE_ENV: &str = "CLAUDE_UPDATER_SKIP_UPDATE";
pub const REGISTRY_ENV: &str = "CLAUDE_UPDATER_REGISTRY";

/// Settings read from `~/.claude-code-updater/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Check for a newer Claude Code before every launch
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,

    /// npm registry queried for the latest published version
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Upper bound on the registry request
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_update: default_auto_update(),
            registry: default_registry(),
            check_timeout_secs: default_check_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Apply `CLAUDE_UPDATER_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup(SKIP_UPDATE_ENV).is_some_and(|value| is_truthy(&value)) {
            self.auto_update = false;
        }

        if let Some(registry) = lookup(REGISTRY_ENV).filter(|value| !value.trim().is_empty()) {
            self.registry = registry.trim().to_string();
        }

        self
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs.max(1))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_auto_update() -> bool {
    true
}

fn default_registry() -> String {
    DEFAULT_REGISTRY.to_string()
}

fn default_check_timeout_secs() -> u64 {
    DEFAULT_CHECK_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert!(config.auto_update);
        assert_eq!(config.registry, "https://registry.npmjs.org");
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "auto_update = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.auto_update);
        assert_eq!(config.check_timeout_secs, 5);
    }

    #[test]
    fn test_load_malformed_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "auto_update = \"sometimes\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[rstest]
    #[case("1", false)]
    #[case("true", false)]
    #[case("YES", false)]
    #[case("0", true)]
    #[case("", true)]
    fn test_skip_update_override(#[case] value: &str, #[case] expected_auto_update: bool) {
        let vars = HashMap::from([(SKIP_UPDATE_ENV, value.to_string())]);
        let config = Config::default().with_overrides(|key| vars.get(key).cloned());
        assert_eq!(config.auto_update, expected_auto_update);
    }

    #[test]
    fn test_registry_override() {
        let vars = HashMap::from([(REGISTRY_ENV, " https://mirror.example.com ".to_string())]);
        let config = Config::default().with_overrides(|key| vars.get(key).cloned());
        assert_eq!(config.registry, "https://mirror.example.com");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_overrides_read_process_environment() {
        env::set_var(REGISTRY_ENV, "https://env.example.com");
        env::set_var(SKIP_UPDATE_ENV, "on");

        let config = Config::default().with_env_overrides();

        env::remove_var(REGISTRY_ENV);
        env::remove_var(SKIP_UPDATE_ENV);
        assert_eq!(config.registry, "https://env.example.com");
        assert!(!config.auto_update);
    }

    #[test]
    fn test_check_timeout_is_never_zero() {
        let config = Config {
            check_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.check_timeout(), Duration::from_secs(1));
    }
}
