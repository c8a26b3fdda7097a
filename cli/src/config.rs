// Configuration management for the aodv-sim CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/aodv-sim/config.json
// - Linux: ~/.config/aodv-sim/config.json
// - Windows: %APPDATA%\aodv-sim\config.json

use anyhow::{Context, Result};
use aodv_sim_core::{DiscoverySettings, HopCountMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How step results and events are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFormat {
    Text,
    Json,
}

impl std::str::FromStr for EventFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Invalid event format '{}' (expected text or json)", other),
        }
    }
}

impl std::fmt::Display for EventFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery defaults applied to scenarios that carry no settings
    pub discovery: DiscoverySettings,

    /// Log filter used when RUST_LOG is unset
    pub log_level: String,

    /// Output format for results and events
    pub event_format: EventFormat,

    /// Where this config was loaded from (not persisted)
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoverySettings::default(),
            log_level: "warn".to_string(),
            event_format: EventFormat::Text,
            path: None,
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("aodv-sim");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from `path` (or the default location), creating it if missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_file = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file()?,
        };

        if config_file.exists() {
            let contents =
                std::fs::read_to_string(&config_file).context("Failed to read config file")?;
            let mut config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config.path = Some(config_file);
            Ok(config)
        } else {
            let config = Config {
                path: Some(config_file),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save config to the file it was loaded from
    pub fn save(&self) -> Result<()> {
        let config_file = match &self.path {
            Some(p) => p.clone(),
            None => Self::config_file()?,
        };
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_file, contents).context("Failed to write config file")?;
        tracing::debug!("Saved config to {}", config_file.display());
        Ok(())
    }

    /// Set a config value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hop_count_mode" => {
                self.discovery.hop_count_mode = value
                    .parse::<HopCountMode>()
                    .map_err(anyhow::Error::msg)?;
            }
            "record_reachability" => {
                self.discovery.record_reachability =
                    value.parse().context("Invalid boolean value")?;
            }
            "log_level" => {
                tracing_subscriber::EnvFilter::try_new(value).context("Invalid log filter")?;
                self.log_level = value.to_string();
            }
            "event_format" => {
                self.event_format = value.parse()?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        self.save()?;
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "hop_count_mode" => Some(self.discovery.hop_count_mode.to_string()),
            "record_reachability" => Some(self.discovery.record_reachability.to_string()),
            "log_level" => Some(self.log_level.clone()),
            "event_format" => Some(self.event_format.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        ["hop_count_mode", "record_reachability", "log_level", "event_format"]
            .iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}
