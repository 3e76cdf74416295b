use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::startup::{RunMode, Step, StepTask, TransitionSpec};
use crate::theme::Theme;

/// Loader configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub title: String,
    pub tick_rate_ms: u64,
    pub enter_ms: u64,
    pub exit_ms: u64,
    pub reduce_motion: bool,
    pub theme: String,
    pub run_mode: RunMode,
    pub steps: Vec<StepConfig>,
}

/// A step of the loading session and the simulated work behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub done: bool,
}

impl StepConfig {
    fn new(id: &str, message: &str, delay_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            message: message.to_string(),
            delay_ms,
            done: false,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            title: "Getting things ready".to_string(),
            tick_rate_ms: 50,
            enter_ms: 250,
            exit_ms: 400,
            reduce_motion: false,
            theme: Theme::default().name,
            run_mode: RunMode::Sequential,
            steps: vec![
                StepConfig::new("config", "Reading configuration", 400),
                StepConfig::new("schema", "Loading schema definitions", 700),
                StepConfig::new("validators", "Compiling validators", 900),
                StepConfig::new("errors", "Registering error formatters", 500),
                StepConfig::new("content", "Indexing documentation", 1200),
            ],
        }
    }
}

impl LoaderConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the built-in configuration; a missing
    /// explicit file is an error.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_file_path(), false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(anyhow!("Config file not found: {}", config_path.display()));
            }
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config in {}", config_path.display()))?;
        tracing::info!("Loaded loader config from {}", config_path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, or the default location
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_file_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_ms == 0 {
            return Err(anyhow!("tick_rate_ms must be greater than zero"));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                return Err(anyhow!("Step ids must not be empty"));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(anyhow!("Duplicate step id '{}'", step.id));
            }
        }

        if Theme::by_name(&self.theme).is_none() {
            return Err(anyhow!("Unknown theme '{}'", self.theme));
        }
        Ok(())
    }

    /// Default configuration file location
    pub fn config_file_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("readiness").join("loader.toml")
        } else {
            PathBuf::from(".").join("loader.toml")
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn transitions(&self) -> TransitionSpec {
        if self.reduce_motion {
            return TransitionSpec::instant();
        }
        TransitionSpec::new(
            Duration::from_millis(self.enter_ms),
            Duration::from_millis(self.exit_ms),
        )
    }

    pub fn theme(&self) -> Theme {
        Theme::by_name(&self.theme).unwrap_or_default()
    }

    /// The step sequence for a new session
    pub fn steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .map(|step| {
                if step.done {
                    Step::completed(step.id.as_str(), step.message.as_str())
                } else {
                    Step::new(step.id.as_str(), step.message.as_str())
                }
            })
            .collect()
    }

    /// Simulated work for every step that is not already done
    pub fn tasks(&self) -> Vec<StepTask> {
        self.steps
            .iter()
            .filter(|step| !step.done)
            .map(|step| StepTask::new(step.id.as_str(), Duration::from_millis(step.delay_ms)))
            .collect()
    }
}
