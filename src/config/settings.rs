use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const RUNNER_VERSION: u32 = 2;
pub const DEFAULT_WRITE_ROOT: &str = "Assets/AutoGen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    #[default]
    DeadLetter,
    Requeue,
}

impl RecoveryPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeadLetter => "dead_letter",
            Self::Requeue => "requeue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enable_runner: bool,
    #[serde(default)]
    pub verbose_logging: bool,
    #[serde(default = "default_write_root")]
    pub default_write_root: String,
    #[serde(default = "default_allowed_write_roots")]
    pub allowed_write_roots: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
    #[serde(default = "default_stale_working_secs")]
    pub stale_working_secs: u64,
    #[serde(default)]
    pub recovery_policy: RecoveryPolicy,
    #[serde(default = "default_scene_file")]
    pub scene_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_runner: true,
            verbose_logging: false,
            default_write_root: default_write_root(),
            allowed_write_roots: default_allowed_write_roots(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            stale_working_secs: default_stale_working_secs(),
            recovery_policy: RecoveryPolicy::default(),
            scene_file: default_scene_file(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_write_root.trim().is_empty() {
            return Err(ConfigError::Settings(
                "default_write_root must be non-empty".to_string(),
            ));
        }
        if self.allowed_write_roots.is_empty() {
            return Err(ConfigError::Settings(
                "allowed_write_roots must list at least one root".to_string(),
            ));
        }
        if let Some(blank) = self
            .allowed_write_roots
            .iter()
            .position(|root| root.trim().is_empty())
        {
            return Err(ConfigError::Settings(format!(
                "allowed_write_roots[{blank}] must be non-empty"
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Settings(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(ConfigError::Settings(format!(
                "max_poll_interval_ms ({}) must be >= poll_interval_ms ({})",
                self.max_poll_interval_ms, self.poll_interval_ms
            )));
        }
        if self.scene_file.trim().is_empty() {
            return Err(ConfigError::Settings(
                "scene_file must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_write_root() -> String {
    DEFAULT_WRITE_ROOT.to_string()
}

fn default_allowed_write_roots() -> Vec<String> {
    vec![DEFAULT_WRITE_ROOT.to_string()]
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_poll_interval_ms() -> u64 {
    4000
}

fn default_stale_working_secs() -> u64 {
    300
}

fn default_scene_file() -> String {
    "Scenes/main.scene.json".to_string()
}
