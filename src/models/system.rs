// CPU, memory, system identity and aggregate snapshot models

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DiskSnapshot, GpuSnapshot, NetworkCounters, NetworkSnapshot, ProcessSnapshot};
use crate::error::{Domain, DomainError};
use crate::units::Capacity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuFrequency {
    pub current_mhz: Option<f64>,
    pub min_mhz: Option<f64>,
    pub max_mhz: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSnapshot {
    pub model: Option<String>,
    pub physical_cores: Option<u32>,
    pub logical_cores: Option<u32>,
    /// Null when the frequency probe is unsupported; individual bounds may also be null.
    pub frequency: Option<CpuFrequency>,
    /// One 0-100 entry per logical core; null unless its length matches `logical_cores`.
    pub per_core_usage: Option<Vec<f64>>,
    pub total_usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub memory: Option<Capacity>,
    pub usage_percent: Option<f64>,
    pub swap: Option<Capacity>,
    pub swap_usage_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    pub percent: f64,
    pub power_plugged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub name: String,
    pub terminal: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIdentity {
    pub os_name: Option<String>,
    pub os_release: Option<String>,
    pub os_version: Option<String>,
    pub distribution: Option<String>,
    pub architecture: Option<String>,
    pub hostname: Option<String>,
    pub cpu_model: Option<String>,
    /// Seconds since the Unix epoch.
    pub boot_time: Option<u64>,
    pub uptime_secs: Option<u64>,
    pub uptime_display: Option<String>,
    /// Null on machines without a battery.
    pub battery: Option<BatteryStatus>,
    /// First logged-in session; null on headless hosts.
    pub user: Option<UserSession>,
}

impl SystemIdentity {
    /// "{system} {release} {version}" as shown by `uname`, skipping missing parts.
    pub fn os_details(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.os_name, &self.os_release, &self.os_version]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// One fully-built capture of every domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    /// Capture time, milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
    pub disk: DiskSnapshot,
    pub network: NetworkSnapshot,
    pub processes: ProcessSnapshot,
    pub gpu: GpuSnapshot,
    pub system: SystemIdentity,
    pub errors: Vec<DomainError>,
}

impl SystemSnapshot {
    pub fn error_for(&self, domain: Domain) -> Option<&DomainError> {
        self.errors.iter().find(|e| e.domain == domain)
    }
}

/// Per-second rates derived from two consecutive snapshots' cumulative counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRates {
    pub elapsed_secs: Option<f64>,
    pub bytes_sent_per_sec: Option<f64>,
    pub bytes_recv_per_sec: Option<f64>,
    pub packets_sent_per_sec: Option<f64>,
    pub packets_recv_per_sec: Option<f64>,
}

impl DerivedRates {
    /// `(current - previous) / elapsed`. All null without a previous sample, with a zero
    /// elapsed time, or when a counter went backwards (reset across reboot or wrap).
    pub fn between(
        previous: Option<&NetworkCounters>,
        current: Option<&NetworkCounters>,
        elapsed: Duration,
    ) -> Self {
        let (Some(prev), Some(cur)) = (previous, current) else {
            return Self::default();
        };
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Self::default();
        }
        let rate = |now: u64, before: u64| -> Option<f64> {
            now.checked_sub(before).map(|d| d as f64 / secs)
        };
        Self {
            elapsed_secs: Some(secs),
            bytes_sent_per_sec: rate(cur.bytes_sent, prev.bytes_sent),
            bytes_recv_per_sec: rate(cur.bytes_recv, prev.bytes_recv),
            packets_sent_per_sec: rate(cur.packets_sent, prev.packets_sent),
            packets_recv_per_sec: rate(cur.packets_recv, prev.packets_recv),
        }
    }
}

/// One item of a polling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledSnapshot {
    /// 1-based position within the session.
    pub sequence: u64,
    pub snapshot: SystemSnapshot,
    pub rates: DerivedRates,
}
