use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

fn default_timeout() -> u64 {
    30
}

fn default_destination() -> String {
    "stdout".to_owned()
}

/// Policy enforcement mode for one invocation or shell session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    #[default]
    Unrestricted,
    Restricted,
    ConfirmAll,
}

/// Allow/block lists plus mode. Loaded once per invocation, never mutated
/// during a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub mode: PolicyMode,
    /// Empty means no allow-list restriction.
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    #[serde(default)]
    pub blocked_commands: Vec<String>,
}

/// Process execution settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Override the shell used to run commands; defaults to the detected one.
    #[serde(default)]
    pub shell: Option<String>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            shell: None,
        }
    }
}

/// Run-record logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,
    /// `"stdout"` or a file path for JSON-lines records.
    #[serde(default = "default_destination")]
    pub destination: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: default_destination(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub exec: ExecConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")
    }
}
