use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_CYCLE_DEADLINE_MARGIN_SECS, DEFAULT_CYCLE_INTERVAL_SECS,
    DEFAULT_MAX_ATTACHMENT_BYTES, DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_MAX_PER_SOURCE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STATE_DIR,
};
use crate::pipeline::PipelineSettings;

/// Agent configuration, loadable from YAML with sane defaults throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the collection endpoint
    pub base_url: String,

    /// Subject/user identifier; may instead come from the identity store
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_per_source")]
    pub max_per_source: usize,

    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,

    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,

    #[serde(default = "default_cycle_deadline_margin_secs")]
    pub cycle_deadline_margin_secs: u64,

    /// Directories scanned for media files
    #[serde(default)]
    pub media_roots: Vec<PathBuf>,

    /// System-wide application roots
    #[serde(default)]
    pub system_app_roots: Vec<PathBuf>,

    /// Per-user application roots
    #[serde(default)]
    pub user_app_roots: Vec<PathBuf>,

    /// Spool directory the notification subsystem writes captured events to
    #[serde(default)]
    pub event_spool_dir: Option<PathBuf>,

    /// Directory for persisted agent state (identity)
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_max_per_source() -> usize {
    DEFAULT_MAX_PER_SOURCE
}
fn default_max_attachment_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}
fn default_max_concurrent_uploads() -> usize {
    DEFAULT_MAX_CONCURRENT_UPLOADS
}
fn default_cycle_interval_secs() -> u64 {
    DEFAULT_CYCLE_INTERVAL_SECS
}
fn default_cycle_deadline_margin_secs() -> u64 {
    DEFAULT_CYCLE_DEADLINE_MARGIN_SECS
}
fn default_state_dir() -> PathBuf {
    dirs_fallback_state_dir()
}

fn dirs_fallback_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_STATE_DIR)
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user_id: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_per_source: DEFAULT_MAX_PER_SOURCE,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
            cycle_deadline_margin_secs: DEFAULT_CYCLE_DEADLINE_MARGIN_SECS,
            media_roots: Vec::new(),
            system_app_roots: vec![PathBuf::from("/usr/share/applications")],
            user_app_roots: Vec::new(),
            event_spool_dir: None,
            state_dir: dirs_fallback_state_dir(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: AgentConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        std::fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Cycle deadline: the interval minus the safety margin, floored so a
    /// short interval still leaves a usable budget.
    pub fn cycle_deadline(&self) -> Duration {
        let secs = self
            .cycle_interval_secs
            .saturating_sub(self.cycle_deadline_margin_secs)
            .max(1);
        Duration::from_secs(secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_per_source: self.max_per_source,
            max_attachment_bytes: self.max_attachment_bytes,
            max_concurrent_uploads: self.max_concurrent_uploads,
            cycle_deadline: self.cycle_deadline(),
        }
    }
}

/// Load a configuration file or fall back to the defaults.
///
/// A provided path must exist and parse; with no path the defaults are used
/// and overrides come from the CLI.
pub fn load_or_create_config(config_path: Option<&Path>) -> Result<AgentConfig> {
    match config_path {
        Some(path) => AgentConfig::from_yaml_file(path),
        None => {
            debug!("No config file provided, using defaults");
            Ok(AgentConfig::default())
        }
    }
}
