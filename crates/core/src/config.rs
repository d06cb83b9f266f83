// User configuration.
//
// Global config: `~/.cowrite/config.toml` (or `$COWRITE_HOME/config.toml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the `~/.cowrite` state directory.
pub const HOME_ENV: &str = "COWRITE_HOME";

/// Root directory for CoWrite state: `~/.cowrite/`.
pub fn global_dir() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|h| h.join(".cowrite")),
    }
}

/// Path to the global config file: `~/.cowrite/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

// ── Global config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Cloud store connection. Without a base URL the cloud workspace is unavailable.
    pub cloud: CloudConfig,
    pub autosave: AutosaveConfig,
    /// Session database location (defaults to `~/.cowrite/session.db`).
    pub session_db: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load `~/.cowrite/config.toml`. A missing file (or home directory)
    /// yields defaults; an unreadable or invalid file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match global_config_path() {
            Some(path) => Self::load_or_default(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load a specific file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(ConfigError::Parse),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    /// Effective session database path.
    pub fn session_db_path(&self) -> Option<PathBuf> {
        self.session_db.clone().or_else(|| global_dir().map(|d| d.join("session.db")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CloudConfig {
    /// API origin, e.g. `https://cowrite.example.com`.
    pub base_url: Option<String>,
    /// Pre-established session cookie (`name=value`) seeded into the client's jar.
    pub session_cookie: Option<String>,
    /// Per-request HTTP client timeout. 0 (the default) sets none, leaving
    /// timeouts to the transport and server.
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self { base_url: None, session_cookie: None, timeout_secs: 0 }
    }
}

impl CloudConfig {
    /// `None` when the timeout is disabled (0).
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before a save is issued.
    pub delay_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

impl AutosaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
