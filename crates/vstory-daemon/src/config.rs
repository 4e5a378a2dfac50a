//! Configuration file management.
//!
//! `config.toml` lives in the data directory. Every section and field has a
//! default, so a missing file or a partial file is fine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vstory_ledger::{LedgerPolicy, QuestPolicy};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "VSTORY_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Tip and withdrawal limits.
    #[serde(default)]
    pub ledger: LedgerPolicy,
    /// Daily quest rewards.
    #[serde(default)]
    pub quests: QuestPolicy,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Capacity of the event bus buffer per subscriber.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file body.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject limits the ledger cannot operate with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ledger = &self.ledger;
        if ledger.tip_min == 0 || ledger.tip_min > ledger.tip_max {
            anyhow::bail!(
                "ledger.tip_min ({}) must be positive and not above ledger.tip_max ({})",
                ledger.tip_min,
                ledger.tip_max
            );
        }
        if ledger.min_withdrawal == 0 {
            anyhow::bail!("ledger.min_withdrawal must be positive");
        }
        if ledger.payout_per_coin == 0 {
            anyhow::bail!("ledger.payout_per_coin must be positive");
        }
        if !(-12..=14).contains(&self.quests.utc_offset_hours) {
            anyhow::bail!(
                "quests.utc_offset_hours ({}) is not a real time zone",
                self.quests.utc_offset_hours
            );
        }
        if self.advanced.event_buffer == 0 {
            anyhow::bail!("advanced.event_buffer must be positive");
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/VStory")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".vstory")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/vstory"))
}
