// Process models

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::units;

/// How per-process CPU percent is sampled.
///
/// `Instant` takes a single refresh: a process seen for the first time may report 0 %
/// because the underlying counter needs two observations. That is expected.
/// `Blocking` refreshes twice, `window_ms` apart, so first reads are accurate at the cost
/// of blocking the process collector for the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProcessCpuMode {
    #[default]
    Instant,
    Blocking {
        #[serde(rename = "windowMs")]
        window_ms: u64,
    },
}

impl ProcessCpuMode {
    pub fn blocking(window: Duration) -> Self {
        ProcessCpuMode::Blocking {
            window_ms: window.as_millis().min(u64::MAX as u128) as u64,
        }
    }

    pub fn window(&self) -> Option<Duration> {
        match self {
            ProcessCpuMode::Instant => None,
            ProcessCpuMode::Blocking { window_ms } => Some(Duration::from_millis(*window_ms)),
        }
    }
}

/// One visible process. `pid` is only unique while the process lives; the OS may reuse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    /// Resident set size in bytes.
    pub memory_bytes: u64,
    /// Creation time, seconds since the Unix epoch.
    pub start_time: Option<u64>,
}

impl ProcessRecord {
    pub fn memory_human(&self) -> String {
        units::format_bytes(self.memory_bytes)
    }

    /// Creation time as local `YYYY-MM-DD HH:MM:SS`.
    pub fn started_at_local(&self) -> Option<String> {
        let secs = i64::try_from(self.start_time?).ok()?;
        let utc = chrono::DateTime::from_timestamp(secs, 0)?;
        Some(
            utc.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    /// Null when enumeration failed outright.
    pub processes: Option<Vec<ProcessRecord>>,
    /// Records dropped because their detail fetch failed (exited mid-enumeration, denied).
    pub dropped: u32,
    pub cpu_sampling: ProcessCpuMode,
}
