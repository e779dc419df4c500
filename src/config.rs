use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::collectors::CollectorConfig;
use crate::error::ConfigurationError;
use crate::models::ProcessCpuMode;
use crate::poller::PollConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub polling: PollingConfig,
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Enables POST /api/processes/{pid}/terminate.
    #[serde(default)]
    pub allow_process_termination: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Unset: the feed runs until shutdown.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    pub cpu_stats_frequency_ms: u64,
    /// Max number of snapshots kept in the broadcast channel for /ws/system (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessCpuSetting {
    #[default]
    Instant,
    Blocking,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub process_cpu_mode: ProcessCpuSetting,
    /// Sampling window for `blocking` mode.
    #[serde(default = "default_process_cpu_sample_ms")]
    pub process_cpu_sample_ms: u64,
}

fn default_process_cpu_sample_ms() -> u64 {
    200
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            process_cpu_mode: ProcessCpuSetting::default(),
            process_cpu_sample_ms: default_process_cpu_sample_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (ws_system clients, snapshots published) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_config(&self) -> Result<PollConfig, ConfigurationError> {
        PollConfig::new(
            Duration::from_millis(self.polling.interval_ms),
            self.polling.duration_secs.map(Duration::from_secs),
        )
    }

    pub fn collector_config(&self) -> CollectorConfig {
        let process_cpu = match self.collection.process_cpu_mode {
            ProcessCpuSetting::Instant => ProcessCpuMode::Instant,
            ProcessCpuSetting::Blocking => ProcessCpuMode::blocking(Duration::from_millis(
                self.collection.process_cpu_sample_ms,
            )),
        };
        CollectorConfig { process_cpu }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.polling.interval_ms > 0,
            "polling.interval_ms must be > 0, got {}",
            self.polling.interval_ms
        );
        if let Some(d) = self.polling.duration_secs {
            anyhow::ensure!(d > 0, "polling.duration_secs must be > 0 when set, got {}", d);
        }
        anyhow::ensure!(
            self.publishing.cpu_stats_frequency_ms > 0,
            "publishing.cpu_stats_frequency_ms must be > 0, got {}",
            self.publishing.cpu_stats_frequency_ms
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.collection.process_cpu_sample_ms > 0,
            "collection.process_cpu_sample_ms must be > 0, got {}",
            self.collection.process_cpu_sample_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
