//! keeper.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub health: HealthSettings,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on registrations returned by a single list call.
    pub max_result_count: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 59890,
            max_result_count: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/keeper"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Bound on a single probe attempt.
    pub probe_timeout: String,
    /// Shortest `healthCheck.interval` a registration may declare.
    pub min_interval: String,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            probe_timeout: "2s".to_string(),
            min_interval: "5s".to_string(),
        }
    }
}

impl HealthSettings {
    pub fn probe_timeout(&self) -> anyhow::Result<Duration> {
        Ok(parse_duration(&self.probe_timeout)?)
    }

    pub fn min_interval(&self) -> anyhow::Result<Duration> {
        Ok(parse_duration(&self.min_interval)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl KeeperConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: KeeperConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints. Probes must finish before the next
    /// tick of the fastest allowed interval.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service.port == 0 {
            anyhow::bail!("service.port must be non-zero");
        }
        if self.service.max_result_count == 0 {
            anyhow::bail!("service.max_result_count must be positive");
        }
        let timeout = self.health.probe_timeout()?;
        let min_interval = self.health.min_interval()?;
        if timeout.is_zero() {
            anyhow::bail!("health.probe_timeout must be positive");
        }
        if timeout >= min_interval {
            anyhow::bail!(
                "health.probe_timeout ({}) must be shorter than health.min_interval ({})",
                self.health.probe_timeout,
                self.health.min_interval
            );
        }
        Ok(())
    }

    /// Path of the redb database file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join("keeper.redb")
    }
}
