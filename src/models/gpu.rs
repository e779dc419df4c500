// GPU models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuDevice {
    pub index: u32,
    pub name: Option<String>,
    pub load_percent: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub memory_total_mb: Option<f64>,
    pub temperature_celsius: Option<f64>,
}

/// `devices` is null when no GPU is present or no driver exposes stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuSnapshot {
    pub devices: Option<Vec<GpuDevice>>,
}

impl GpuSnapshot {
    pub fn unavailable() -> Self {
        Self { devices: None }
    }

    pub fn is_available(&self) -> bool {
        self.devices.is_some()
    }

    /// First device, the one single-GPU readers report.
    pub fn primary(&self) -> Option<&GpuDevice> {
        self.devices.as_ref()?.first()
    }
}
