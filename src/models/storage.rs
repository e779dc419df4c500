// Disk / partition models

use serde::{Deserialize, Serialize};

use crate::units::Capacity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionUsage {
    pub device: String,
    pub mountpoint: String,
    pub fs_type: String,
    pub capacity: Capacity,
    pub usage_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSnapshot {
    /// Partitions that reported usage. Null when partitions could not be listed at all.
    pub partitions: Option<Vec<PartitionUsage>>,
    /// Sum over `partitions` only.
    pub total: Option<Capacity>,
    /// Usage of the partition mounted at `/`, when it reported.
    pub root_usage_percent: Option<f64>,
    /// Mountpoints whose usage probe failed (excluded from list and sum).
    pub skipped: Vec<String>,
}
