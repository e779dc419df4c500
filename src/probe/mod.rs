//! Platform probe: one call per OS/hardware fact.
//!
//! Collectors only talk to the OS through [`PlatformProbe`]. Each call returns raw
//! values in base units (bytes, MHz, seconds since the Unix epoch) or a
//! [`ProbeError`] saying whether the fact is unsupported or failed this time.

mod linux;
mod nvidia;
mod sysinfo_probe;

pub use nvidia::parse_nvidia_smi;
pub use sysinfo_probe::SysinfoProbe;

use crate::error::ProbeResult;
use crate::models::{
    BatteryStatus, Duplex, GpuDevice, NetworkCounters, ProcessCpuMode, UserSession,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounts {
    pub physical: Option<u32>,
    pub logical: u32,
}

/// Frequencies in MHz; `min`/`max` are often not exposed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCpuFrequency {
    pub current: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CpuUsage {
    Total(f64),
    PerCore(Vec<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub device: String,
    pub mountpoint: String,
    pub fs_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStats {
    pub name: String,
    /// Null when the platform doesn't report link state.
    pub is_up: Option<bool>,
    pub speed_mbps: Option<u64>,
    pub duplex: Duplex,
    pub mtu: Option<u32>,
    pub mac_address: Option<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessSelection {
    All,
    Only(Vec<u32>),
}

/// Which processes `process_list` refreshes, and how CPU is sampled while doing so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessQuery {
    pub selection: ProcessSelection,
    pub cpu_sampling: ProcessCpuMode,
}

impl ProcessQuery {
    pub fn all(cpu_sampling: ProcessCpuMode) -> Self {
        Self {
            selection: ProcessSelection::All,
            cpu_sampling,
        }
    }

    pub fn single(pid: u32, cpu_sampling: ProcessCpuMode) -> Self {
        Self {
            selection: ProcessSelection::Only(vec![pid]),
            cpu_sampling,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub start_time: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsIdentity {
    /// Kernel's system name, `uname -s`.
    pub name: Option<String>,
    /// `uname -r`
    pub release: Option<String>,
    /// Kernel build string, `uname -v`.
    pub version: Option<String>,
    /// Distribution or product name, e.g. "Debian GNU/Linux 12 (bookworm)".
    pub distribution: Option<String>,
    pub architecture: Option<String>,
    pub hostname: Option<String>,
    pub cpu_model: Option<String>,
}

/// Narrow OS/hardware interface consumed by the domain collectors.
///
/// Implementations must not panic across this boundary and must be safe to call from
/// several collector threads at once.
pub trait PlatformProbe: Send + Sync {
    fn cpu_counts(&self) -> ProbeResult<CpuCounts>;

    fn cpu_frequency(&self) -> ProbeResult<RawCpuFrequency>;

    /// Aggregate usage, or one entry per logical core when `per_core` is set.
    fn cpu_percent(&self, per_core: bool) -> ProbeResult<CpuUsage>;

    fn memory_stats(&self) -> ProbeResult<MemoryStats>;

    fn swap_stats(&self) -> ProbeResult<SwapStats>;

    fn disk_partitions(&self) -> ProbeResult<Vec<PartitionInfo>>;

    fn disk_usage(&self, mountpoint: &str) -> ProbeResult<DiskUsage>;

    fn network_interface_stats(&self) -> ProbeResult<Vec<InterfaceStats>>;

    fn network_io_counters(&self) -> ProbeResult<NetworkCounters>;

    /// Refreshes the selected processes and returns the pids now visible.
    fn process_list(&self, query: &ProcessQuery) -> ProbeResult<Vec<u32>>;

    /// Detail for a pid from the last `process_list` refresh. A pid that exited since is
    /// a transient failure.
    fn process_detail(&self, pid: u32) -> ProbeResult<RawProcess>;

    /// Empty when no GPU is visible.
    fn gpu_list(&self) -> ProbeResult<Vec<GpuDevice>>;

    fn os_identity(&self) -> ProbeResult<OsIdentity>;

    /// Seconds since the Unix epoch.
    fn boot_time(&self) -> ProbeResult<u64>;

    /// `Ok(None)` when the machine has no battery.
    fn battery_status(&self) -> ProbeResult<Option<BatteryStatus>>;

    fn logged_in_users(&self) -> ProbeResult<Vec<UserSession>>;
}

/// Process control, kept apart from [`PlatformProbe`] so read-only collectors never see it.
pub trait ProcessControl: Send + Sync {
    fn terminate_process(&self, pid: u32) -> ProbeResult<()>;
}
