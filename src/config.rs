use crate::logging::{LogLevel, LoggerOptions};
use crate::paths;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "DEVFLOW_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DEVFLOW_LOG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DevflowConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Audit logger settings. Every field is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Minimum level written to either sink. Default: info
    #[serde(default)]
    pub level: LogLevel,
    /// Mirror entries to the terminal. Default: true
    #[serde(default = "default_true")]
    pub console: bool,
    /// Persist entries as JSONL. Default: true
    #[serde(default = "default_true")]
    pub durable: bool,
    /// Defaults to `~/.devflow/logs/<wd-hash>/`
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Defaults to a fresh UUID per run
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            console: true,
            durable: true,
            log_dir: None,
            session_id: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct LoggingOverrides {
    pub level: Option<LogLevel>,
    pub log_dir: Option<PathBuf>,
    pub no_console: bool,
    pub no_durable: bool,
    pub session_id: Option<String>,
}

impl DevflowConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        Ok(config)
    }

    /// Loads `explicit` if given (and fails if it cannot be read). Otherwise
    /// tries `~/.devflow/config.yaml`, falling back to defaults when it is
    /// missing or broken.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let Ok(path) = paths::default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Ignoring {}: {:#}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Applies `DEVFLOW_LOG_LEVEL` and `DEVFLOW_LOG_DIR` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies environment overrides read through `lookup`. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(level) = present(ENV_LOG_LEVEL) {
            self.logging.level = level
                .parse()
                .map_err(|e: String| anyhow!("{}: {}", ENV_LOG_LEVEL, e))?;
        }
        if let Some(dir) = present(ENV_LOG_DIR) {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.level {
            self.logging.level = level;
        }
        if let Some(dir) = &overrides.log_dir {
            self.logging.log_dir = Some(dir.clone());
        }
        if overrides.no_console {
            self.logging.console = false;
        }
        if overrides.no_durable {
            self.logging.durable = false;
        }
        if let Some(session_id) = &overrides.session_id {
            self.logging.session_id = Some(session_id.clone());
        }
    }

    /// Resolves the logger options, defaulting the log directory from `working_dir`.
    pub fn to_logger_options(&self, working_dir: &Path) -> Result<LoggerOptions> {
        let log_dir = match &self.logging.log_dir {
            Some(dir) => dir.clone(),
            None => paths::logs_dir(working_dir)?,
        };
        Ok(LoggerOptions {
            min_level: self.logging.level,
            console: self.logging.console,
            durable: self.logging.durable,
            log_dir,
            session_id: self.logging.session_id.clone(),
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
