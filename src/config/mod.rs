//! Configuration management module
//!
//! Handles loading, validation, and management of application configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::executor::ServerRelease;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Logging level
    pub log_level: String,

    /// Override for the per-user data directory
    pub data_dir: Option<PathBuf>,

    /// File-based logging configuration
    pub log: LogConfig,

    /// Remote console configuration
    pub rcon: RconConfig,

    /// Desktop notification configuration
    pub notifications: NotificationConfig,

    /// Save credentials after a successful interactive connect
    pub remember_credentials: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RconConfig {
    /// Seconds between liveness checks
    pub check_interval_secs: u64,

    /// Dial and per-exchange timeout in seconds
    pub timeout_seconds: u64,

    /// Game server release the reply tables target
    pub server_release: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Write a log file per run under the logs directory
    pub enable_file: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Raise warnings and errors as desktop notifications
    pub desktop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: None,
            log: LogConfig::default(),
            rcon: RconConfig::default(),
            notifications: NotificationConfig::default(),
            remember_credentials: true,
        }
    }
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 5,
            timeout_seconds: 10,
            server_release: ServerRelease::default().to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        // RCON_ADMIN_LOG_LEVEL - logging level
        if let Ok(log_level) = env::var("RCON_ADMIN_LOG_LEVEL") {
            self.log_level = log_level;
        }

        // RCON_ADMIN_DATA_DIR - data directory
        if let Ok(data_dir) = env::var("RCON_ADMIN_DATA_DIR") {
            if !data_dir.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(data_dir));
            }
        }

        // RCON_ADMIN_LOG_FILE - enable file logging
        if let Ok(enable) = env::var("RCON_ADMIN_LOG_FILE") {
            self.log.enable_file = enable.parse().unwrap_or(self.log.enable_file);
        }

        // RCON_ADMIN_CHECK_INTERVAL_SECS - watchdog interval
        if let Ok(interval) = env::var("RCON_ADMIN_CHECK_INTERVAL_SECS") {
            if let Ok(value) = interval.parse::<u64>() {
                self.rcon.check_interval_secs = value;
            }
        }

        // RCON_ADMIN_TIMEOUT_SECONDS - dial and exchange timeout
        if let Ok(timeout) = env::var("RCON_ADMIN_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.rcon.timeout_seconds = value;
            }
        }

        // RCON_ADMIN_SERVER_RELEASE - reply table selection
        if let Ok(release) = env::var("RCON_ADMIN_SERVER_RELEASE") {
            self.rcon.server_release = release;
        }

        // RCON_ADMIN_DESKTOP_NOTIFICATIONS - desktop notifications
        if let Ok(desktop) = env::var("RCON_ADMIN_DESKTOP_NOTIFICATIONS") {
            self.notifications.desktop = desktop.parse().unwrap_or(self.notifications.desktop);
        }

        // RCON_ADMIN_REMEMBER_CREDENTIALS - save credentials after connect
        if let Ok(remember) = env::var("RCON_ADMIN_REMEMBER_CREDENTIALS") {
            self.remember_credentials = remember.parse().unwrap_or(self.remember_credentials);
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|err| {
            tracing::warn!("Failed to load config: {:#}, using defaults", err);
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.rcon.check_interval_secs == 0 {
            anyhow::bail!("rcon.check_interval_secs must be greater than 0");
        }

        if self.rcon.timeout_seconds == 0 {
            anyhow::bail!("rcon.timeout_seconds must be greater than 0");
        }

        self.server_release()?;
        Ok(())
    }

    pub fn server_release(&self) -> Result<ServerRelease> {
        self.rcon
            .server_release
            .parse()
            .map_err(|err: String| anyhow::anyhow!(err))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.rcon.check_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rcon.timeout_seconds.max(1))
    }

    /// Display formatted configuration
    pub fn display(&self) -> Result<()> {
        println!("Current configuration:");
        println!(
            "{}",
            toml::to_string_pretty(self).context("Failed to serialize configuration")?
        );
        Ok(())
    }

    /// Display configuration management help
    pub fn display_help() -> Result<()> {
        println!("Configuration management commands:");
        println!("  rcon-admin config show    - Show current configuration");
        println!("  rcon-admin config reset   - Write the default configuration");
        Ok(())
    }

    /// Handle configuration command
    pub fn handle_command(action: &Option<crate::cli::ConfigAction>, path: &Path) -> Result<()> {
        match action {
            Some(crate::cli::ConfigAction::Show) => {
                let config = Config::load_or_default(path);
                config.display()?;
            }
            Some(crate::cli::ConfigAction::Reset) => {
                let default_config = Config::default();
                default_config.save_to_file(path)?;
                println!("Wrote default configuration to {}", path.display());
            }
            None => {
                Config::display_help()?;
            }
        }
        Ok(())
    }
}
