use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::util::expand_tilde;
use crate::{dlog_debug, Error, Result};

pub const DEFAULT_REQUEST_ADDR: &str = "0.0.0.0:5555";
pub const DEFAULT_PUBLISH_ADDR: &str = "0.0.0.0:5556";

/// Reminders fire this long before a task is due.
pub const DEFAULT_LEAD_TIME_SECS: u64 = 60 * 60;

/// How often the reminder scan runs.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub request_addr: Option<String>,
    pub publish_addr: Option<String>,
    pub lead_time_secs: Option<u64>,
    pub tick_interval_secs: Option<u64>,
    pub task_file: Option<String>,
    pub log_file: Option<String>,
}

impl Config {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".duebell"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("duebell.toml"))
    }

    pub fn request_addr(&self) -> &str {
        self.request_addr.as_deref().unwrap_or(DEFAULT_REQUEST_ADDR)
    }

    pub fn publish_addr(&self) -> &str {
        self.publish_addr.as_deref().unwrap_or(DEFAULT_PUBLISH_ADDR)
    }

    pub fn lead_time(&self) -> Duration {
        Duration::from_secs(self.lead_time_secs.unwrap_or(DEFAULT_LEAD_TIME_SECS))
    }

    pub fn tick_interval(&self) -> Duration {
        // A zero interval would panic in tokio::time::interval.
        Duration::from_secs(
            self.tick_interval_secs
                .unwrap_or(DEFAULT_TICK_INTERVAL_SECS)
                .max(1),
        )
    }

    pub fn task_file(&self) -> Result<PathBuf> {
        match &self.task_file {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(Self::app_dir()?.join("tasks.json")),
        }
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(Self::app_dir()?.join("duebell.log")),
        }
    }

    /// Load from `~/.duebell/duebell.toml`, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        dlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            dlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        dlog_debug!(
            "Config loaded: request_addr={}, publish_addr={}, lead={:?}, tick={:?}",
            config.request_addr(),
            config.publish_addr(),
            config.lead_time(),
            config.tick_interval()
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        dlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}
