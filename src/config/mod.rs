// ABOUTME: Tool configuration stored as config.yml in the state directory.
// ABOUTME: Handles defaults, YAML parsing, legacy key spellings, and `config set`.

mod deserialize;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::runtime::RuntimeType;

pub const CONFIG_FILENAME: &str = "config.yml";

pub const DEFAULT_MAX_SNAPSHOTS: usize = 5;
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Prefix every runtime command with `sudo`.
    #[serde(
        default,
        alias = "use_sudo",
        deserialize_with = "deserialize::deserialize_bool"
    )]
    pub use_sudo: bool,

    #[serde(default, alias = "container_runtime")]
    pub container_runtime: RuntimeType,

    /// Untagged, unprotected snapshots kept per container.
    #[serde(
        default = "default_max_snapshots",
        alias = "max_snapshots",
        deserialize_with = "deserialize::deserialize_number"
    )]
    pub max_snapshots: usize,

    /// Untagged, unprotected snapshots older than this are removed.
    #[serde(
        default = "default_retention_days",
        alias = "retention_days",
        deserialize_with = "deserialize::deserialize_number"
    )]
    pub retention_days: u32,

    /// Upper bound on every runtime command.
    #[serde(
        default = "default_command_timeout",
        with = "humantime_serde",
        alias = "command_timeout"
    )]
    pub command_timeout: Duration,
}

fn default_max_snapshots() -> usize {
    DEFAULT_MAX_SNAPSHOTS
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            use_sudo: false,
            container_runtime: RuntimeType::default(),
            max_snapshots: default_max_snapshots(),
            retention_days: default_retention_days(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    /// Load the config at `path`, writing the defaults there on first use.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::debug!("created default config at {}", path.display());
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Apply `config set <key> <value>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<ConfigKey> {
        let key: ConfigKey = key.parse()?;
        let value = value.trim();
        match key {
            ConfigKey::UseSudo => self.use_sudo = parse_bool(value)?,
            ConfigKey::ContainerRuntime => {
                self.container_runtime = value.parse().map_err(Error::InvalidOption)?
            }
            ConfigKey::MaxSnapshots => {
                self.max_snapshots = value.parse().map_err(|_| {
                    Error::InvalidOption(format!(
                        "maxSnapshots must be a non-negative integer, got '{value}'"
                    ))
                })?
            }
            ConfigKey::RetentionDays => {
                self.retention_days = value.parse().map_err(|_| {
                    Error::InvalidOption(format!(
                        "retentionDays must be a non-negative integer, got '{value}'"
                    ))
                })?
            }
            ConfigKey::CommandTimeout => {
                let timeout = humantime_serde::re::humantime::parse_duration(value).map_err(
                    |e| Error::InvalidOption(format!("commandTimeout '{value}': {e}")),
                )?;
                if timeout.is_zero() {
                    return Err(Error::InvalidOption(
                        "commandTimeout must be greater than zero".to_string(),
                    ));
                }
                self.command_timeout = timeout;
            }
        }
        Ok(key)
    }

    /// Current value of `key`, formatted as `config show` prints it.
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::UseSudo => self.use_sudo.to_string(),
            ConfigKey::ContainerRuntime => self.container_runtime.to_string(),
            ConfigKey::MaxSnapshots => self.max_snapshots.to_string(),
            ConfigKey::RetentionDays => self.retention_days.to_string(),
            ConfigKey::CommandTimeout => {
                humantime_serde::re::humantime::format_duration(self.command_timeout).to_string()
            }
        }
    }

    /// How far back untagged snapshots are kept.
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(Error::InvalidOption(format!(
            "expected true or false, got '{value}'"
        ))),
    }
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    UseSudo,
    ContainerRuntime,
    MaxSnapshots,
    RetentionDays,
    CommandTimeout,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::UseSudo,
        ConfigKey::ContainerRuntime,
        ConfigKey::MaxSnapshots,
        ConfigKey::RetentionDays,
        ConfigKey::CommandTimeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::UseSudo => "useSudo",
            ConfigKey::ContainerRuntime => "containerRuntime",
            ConfigKey::MaxSnapshots => "maxSnapshots",
            ConfigKey::RetentionDays => "retentionDays",
            ConfigKey::CommandTimeout => "commandTimeout",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "useSudo" | "use_sudo" => Ok(ConfigKey::UseSudo),
            "containerRuntime" | "container_runtime" => Ok(ConfigKey::ContainerRuntime),
            "maxSnapshots" | "max_snapshots" => Ok(ConfigKey::MaxSnapshots),
            "retentionDays" | "retention_days" => Ok(ConfigKey::RetentionDays),
            "commandTimeout" | "command_timeout" => Ok(ConfigKey::CommandTimeout),
            other => Err(Error::InvalidOption(format!(
                "unknown configuration key '{other}' (use one of: {})",
                ConfigKey::ALL.map(|k| k.as_str()).join(", ")
            ))),
        }
    }
}
