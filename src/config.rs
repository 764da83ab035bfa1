use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::handlers::HandlerSettings;

/// Module configuration, usually read from `yate-extmod.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for every diagnostic line sent to the engine.
    #[serde(default = "default_module_name")]
    pub module_name: String,
    /// SQLite database holding the credentials table.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Statement run for each credential request. The first row's second
    /// column becomes the answer.
    #[serde(default = "default_query")]
    pub query: String,
    /// How long one poll waits for engine input before reporting idle.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
    /// Show passwords in clear text in diagnostic lines.
    #[serde(default)]
    pub show_secrets: bool,
    /// Engine messages to install a handler for, in request order.
    #[serde(default = "default_installs", rename = "install")]
    pub installs: Vec<InstallEntry>,
    /// Engine per-module settings sent with `setlocal` at startup.
    #[serde(default)]
    pub locals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallEntry {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_module_name() -> String {
    "yate-extmod".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("credentials.db")
}

fn default_query() -> String {
    "SELECT username,password FROM yatet".to_string()
}

fn default_idle_interval_ms() -> u64 {
    1000
}

fn default_priority() -> u32 {
    100
}

fn default_installs() -> Vec<InstallEntry> {
    vec![InstallEntry {
        name: "user.auth".to_string(),
        priority: 10,
    }]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_name: default_module_name(),
            database: default_database(),
            query: default_query(),
            idle_interval_ms: default_idle_interval_ms(),
            show_secrets: false,
            installs: default_installs(),
            locals: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            module_name: self.module_name.clone(),
            query: self.query.clone(),
            show_secrets: self.show_secrets,
        }
    }
}

impl FromStr for InstallEntry {
    type Err = anyhow::Error;

    /// Parse `NAME` or `NAME:PRIORITY`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, priority) = match s.rsplit_once(':') {
            Some((name, priority)) => (
                name,
                priority
                    .parse()
                    .with_context(|| format!("invalid priority in '{s}'"))?,
            ),
            None => (s, default_priority()),
        };
        if name.is_empty() {
            anyhow::bail!("install entry '{s}' has no message name");
        }
        Ok(Self {
            name: name.to_string(),
            priority,
        })
    }
}

/// Load configuration from `path`.
///
/// Falls back to defaults if the file is missing.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}
