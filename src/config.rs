use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "FeedConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "FeedConfig::default_pair")]
    pub pair: String,
    #[serde(default = "FeedConfig::default_history_limit")]
    pub history_limit: usize,
}

impl FeedConfig {
    fn default_base_url() -> String {
        "https://economia.awesomeapi.com.br".to_string()
    }

    fn default_pair() -> String {
        "USD-BRL".to_string()
    }

    fn default_history_limit() -> usize {
        100
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: Self::default_base_url(),
            pair: Self::default_pair(),
            history_limit: Self::default_history_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub sales_path: PathBuf,
    pub purchases_path: PathBuf,
    /// Re-query both collections at the start of every cycle instead of once
    /// at startup. A failed reload keeps the previous records.
    #[serde(default)]
    pub reload_each_cycle: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    /// Seconds between cycles while the business-hours gate is open.
    #[serde(default = "RefreshConfig::default_secs")]
    pub interval_secs: u64,
    /// Seconds between gate re-checks while closed.
    #[serde(default = "RefreshConfig::default_secs")]
    pub idle_secs: u64,
}

impl RefreshConfig {
    fn default_secs() -> u64 {
        60
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_secs: Self::default_secs(),
            idle_secs: Self::default_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BusinessHoursConfig {
    #[serde(default = "BusinessHoursConfig::default_enabled")]
    pub enabled: bool,
}

impl BusinessHoursConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        BusinessHoursConfig {
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub business_hours: BusinessHoursConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxdash", "fxdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
