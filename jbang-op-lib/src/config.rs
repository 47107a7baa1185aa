use crate::executor::JBangOperation;
use crate::project::PROJECT_CONFIG_FILE;
use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JBangConfig {
    /// JBang installation directory. Unset means `jbang` from the `PATH`.
    #[serde(default)]
    pub home: Option<PathBuf>,

    /// Arguments placed before the script on every invocation.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub exit_on_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub silent: Option<bool>,
}

impl LogConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn is_silent(&self) -> bool {
        self.silent.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub jbang: JBangConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn load_with_override(config_path: Option<PathBuf>, start_dir: &Path) -> Result<Self> {
        Self::load_cascading(config_path, start_dir)
    }

    fn load_cascading(override_path: Option<PathBuf>, start_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        // 4. Built-in defaults (already applied via Default)

        // 3. Global config
        if let Some(global_config_path) = Self::get_global_config_path() {
            if global_config_path.exists() {
                let global_config = Self::load_from_file(&global_config_path)?;
                config = config.merge_with(global_config);
            }
        }

        // 2. Project-local config
        if let Some(project_config_path) = Self::find_project_config(start_dir) {
            let project_config = Self::load_from_file(&project_config_path)?;
            config = config.merge_with(project_config);
        }

        // 1. Explicit override
        if let Some(override_path) = override_path {
            if override_path.exists() {
                let override_config = Self::load_from_file(&override_path)?;
                config = config.merge_with(override_config);
            } else {
                return Err(anyhow!("Config file not found: {}", override_path.display()));
            }
        }

        // Environment variables (highest precedence)
        Ok(config.apply_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jbang-op").join("config.toml"))
    }

    fn find_project_config(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir;

        loop {
            let config_path = dir.join(PROJECT_CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            dir = dir.parent()?;
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn merge_with(mut self, other: Self) -> Self {
        if other.jbang.home.is_some() {
            self.jbang.home = other.jbang.home;
        }
        if !other.jbang.args.is_empty() {
            self.jbang.args = other.jbang.args;
        }
        if other.jbang.exit_on_failure.is_some() {
            self.jbang.exit_on_failure = other.jbang.exit_on_failure;
        }

        if other.log.level.is_some() {
            self.log.level = other.log.level;
        }
        if other.log.silent.is_some() {
            self.log.silent = other.log.silent;
        }

        self
    }

    fn apply_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = var("JBANG_OP_SILENT") {
            if let Ok(silent) = val.parse() {
                self.log.silent = Some(silent);
            }
        }

        if let Some(val) = var("JBANG_OP_EXIT_ON_FAILURE") {
            if let Ok(exit_on_failure) = val.parse() {
                self.jbang.exit_on_failure = Some(exit_on_failure);
            }
        }

        if let Some(val) = var("JBANG_OP_LOG") {
            if !val.is_empty() {
                self.log.level = Some(val);
            }
        }

        if let Some(val) = var("JBANG_OP_ARGS") {
            let args: Vec<String> = val.split_whitespace().map(|s| s.to_string()).collect();
            if !args.is_empty() {
                self.jbang.args = args;
            }
        }

        self
    }

    /// Applies these settings to an operation. The JBang home is only
    /// replaced when one is configured.
    pub fn configure(&self, op: JBangOperation) -> JBangOperation {
        let mut op = op
            .jbang_args(self.jbang.args.iter().cloned())
            .silent(self.log.is_silent());
        if let Some(home) = &self.jbang.home {
            op = op.jbang_home(home.clone());
        }
        if let Some(exit_on_failure) = self.jbang.exit_on_failure {
            op = op.exit_on_failure(exit_on_failure);
        }
        op
    }
}

const DEFAULT_LOG_LEVEL: &str = "info";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.jbang.home, None);
        assert!(config.jbang.args.is_empty());
        assert_eq!(config.jbang.exit_on_failure, None);
        assert_eq!(config.log.level(), "info");
        assert!(!config.log.is_silent());
    }

    #[test]
    fn test_parse() {
        let config = Config::parse(
            r#"
            [jbang]
            home = "/opt/jbang"
            args = ["--quiet"]
            exit_on_failure = false

            [log]
            level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.jbang.home, Some(PathBuf::from("/opt/jbang")));
        assert_eq!(config.jbang.args, vec!["--quiet".to_string()]);
        assert_eq!(config.jbang.exit_on_failure, Some(false));
        assert_eq!(config.log.level(), "warn");
        assert_eq!(config.log.silent, None);
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(Config::parse("[jbang]\nargs = \"--quiet\"").is_err());
    }

    #[test]
    fn test_merge_keeps_unset_values() {
        let base = Config::parse("[jbang]\nhome = \"/opt/jbang\"\nargs = [\"--quiet\"]").unwrap();
        let other = Config::parse("[log]\nsilent = true").unwrap();

        let merged = base.merge_with(other);
        assert_eq!(merged.jbang.home, Some(PathBuf::from("/opt/jbang")));
        assert_eq!(merged.jbang.args, vec!["--quiet".to_string()]);
        assert!(merged.log.is_silent());
    }

    #[test]
    fn test_project_layer_overrides_global_back_to_defaults() {
        let global = Config::parse("[log]\nsilent = true\nlevel = \"warn\"").unwrap();
        let project = Config::parse("[log]\nsilent = false\nlevel = \"info\"").unwrap();

        let merged = global.merge_with(project);
        assert!(!merged.log.is_silent());
        assert_eq!(merged.log.level(), "info");
    }

    #[test]
    fn test_unset_layer_keeps_previous_log_settings() {
        let global = Config::parse("[log]\nsilent = true\nlevel = \"warn\"").unwrap();

        let merged = global.merge_with(Config::default());
        assert!(merged.log.is_silent());
        assert_eq!(merged.log.level(), "warn");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("JBANG_OP_SILENT", "true"),
            ("JBANG_OP_EXIT_ON_FAILURE", "false"),
            ("JBANG_OP_LOG", "debug"),
            ("JBANG_OP_ARGS", "--quiet  --fresh"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::default().apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.log.is_silent());
        assert_eq!(config.jbang.exit_on_failure, Some(false));
        assert_eq!(config.log.level(), "debug");
        assert_eq!(config.jbang.args, vec!["--quiet", "--fresh"]);
    }

    #[test]
    fn test_unparseable_silent_env_is_ignored() {
        let config = Config::parse("[log]\nsilent = true").unwrap();

        for val in ["1", "yes", ""] {
            let config = config.clone().apply_env_overrides(|key| {
                (key == "JBANG_OP_SILENT").then(|| val.to_string())
            });
            assert!(config.log.is_silent(), "JBANG_OP_SILENT={val:?}");
        }

        let config = config.apply_env_overrides(|key| {
            (key == "JBANG_OP_SILENT").then(|| "false".to_string())
        });
        assert!(!config.log.is_silent());
    }

    #[test]
    fn test_load_project_config_from_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[jbang]\nargs = [\"--verbose\"]\n",
        )
        .unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let path = Config::find_project_config(&nested).unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.jbang.args, vec!["--verbose".to_string()]);
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        let err = Config::load_with_override(Some(missing), temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_configure_operation() {
        let config = Config::parse(
            "[jbang]\nhome = \"/opt/jbang\"\nargs = [\"--quiet\"]\nexit_on_failure = false\n[log]\nsilent = true",
        )
        .unwrap();

        let op = config.configure(JBangOperation::new().jbang_arg("run"));
        assert_eq!(op.get_jbang_args(), ["run", "--quiet"]);
        assert_eq!(op.get_jbang_home(), Some(Path::new("/opt/jbang")));
        assert!(!op.is_exit_on_failure());
        assert!(op.is_silent());
    }

    #[test]
    fn test_configure_keeps_existing_home() {
        let op = Config::default().configure(JBangOperation::new().jbang_home("/usr/local/jbang"));
        assert_eq!(op.get_jbang_home(), Some(Path::new("/usr/local/jbang")));
        assert!(op.is_exit_on_failure());
    }
}
