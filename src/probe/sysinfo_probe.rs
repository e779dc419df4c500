// Platform probe backed by sysinfo, with Linux sysfs/procfs readers for what sysinfo lacks

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use sysinfo::{Disks, Networks, Pid, ProcessesToUpdate, Signal, System};
use tracing::instrument;

use super::{
    CpuCounts, CpuUsage, DiskUsage, InterfaceStats, MemoryStats, OsIdentity, PartitionInfo,
    PlatformProbe, ProcessControl, ProcessQuery, ProcessSelection, RawCpuFrequency, RawProcess,
    SwapStats, linux, nvidia,
};
use crate::error::{ProbeError, ProbeResult};
use crate::models::{BatteryStatus, GpuDevice, NetworkCounters, UserSession};
use crate::units;

const EMPTY_MAC: &str = "00:00:00:00:00:00";

pub struct SysinfoProbe {
    sys: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    last_cpu_refresh: Mutex<Instant>,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> ProbeResult<MutexGuard<'a, T>> {
    m.lock()
        .map_err(|e| ProbeError::transient(format!("sysinfo {} lock poisoned: {}", what, e)))
}

impl SysinfoProbe {
    /// Loads every table once so the first CPU reading has a baseline to diff against.
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Mutex::new(sys),
            disks: Mutex::new(disks),
            networks: Mutex::new(networks),
            last_cpu_refresh: Mutex::new(Instant::now()),
        }
    }

    fn refresh_selected(sys: &mut System, selection: &ProcessSelection) {
        match selection {
            ProcessSelection::All => {
                sys.refresh_processes(ProcessesToUpdate::All, true);
            }
            ProcessSelection::Only(pids) => {
                let pids: Vec<Pid> = pids.iter().map(|p| Pid::from_u32(*p)).collect();
                sys.refresh_processes(ProcessesToUpdate::Some(&pids), true);
            }
        }
    }
}

impl ProcessControl for SysinfoProbe {
    /// SIGTERM where supported, otherwise the platform's default kill.
    #[instrument(skip(self), fields(probe = "sysinfo", operation = "terminate_process"))]
    fn terminate_process(&self, pid: u32) -> ProbeResult<()> {
        let mut sys = lock(&self.sys, "system")?;
        let target = [Pid::from_u32(pid)];
        sys.refresh_processes(ProcessesToUpdate::Some(&target), true);
        let process = sys
            .process(target[0])
            .ok_or_else(|| ProbeError::transient(format!("process {} not found", pid)))?;
        let delivered = match process.kill_with(Signal::Term) {
            Some(delivered) => delivered,
            None => process.kill(),
        };
        if delivered {
            tracing::info!(pid, "sent terminate signal");
            Ok(())
        } else {
            Err(ProbeError::transient(format!(
                "failed to signal process {}",
                pid
            )))
        }
    }
}

impl PlatformProbe for SysinfoProbe {
    fn cpu_counts(&self) -> ProbeResult<CpuCounts> {
        let sys = lock(&self.sys, "system")?;
        let logical = sys.cpus().len() as u32;
        if logical == 0 {
            return Err(ProbeError::unavailable("no CPUs reported"));
        }
        Ok(CpuCounts {
            physical: System::physical_core_count().map(|n| n as u32),
            logical,
        })
    }

    fn cpu_frequency(&self) -> ProbeResult<RawCpuFrequency> {
        let mut sys = lock(&self.sys, "system")?;
        sys.refresh_cpu_frequency();
        let current = sys.cpus().first().map(|c| c.frequency()).unwrap_or(0);
        if current == 0 {
            return Err(ProbeError::unavailable("cpu frequency not exposed"));
        }
        let (min, max) = linux::read_cpu_freq_bounds();
        Ok(RawCpuFrequency {
            current: current as f64,
            min,
            max,
        })
    }

    fn cpu_percent(&self, per_core: bool) -> ProbeResult<CpuUsage> {
        let mut sys = lock(&self.sys, "system")?;
        let mut last = lock(&self.last_cpu_refresh, "cpu refresh")?;
        // Below the minimum interval sysinfo's numbers are noise; reuse the last computed ones
        if last.elapsed() >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
            sys.refresh_cpu_usage();
            *last = Instant::now();
        }
        if per_core {
            Ok(CpuUsage::PerCore(
                sys.cpus()
                    .iter()
                    .map(|c| units::clamp_percent(c.cpu_usage() as f64))
                    .collect(),
            ))
        } else {
            Ok(CpuUsage::Total(units::clamp_percent(
                sys.global_cpu_usage() as f64,
            )))
        }
    }

    fn memory_stats(&self) -> ProbeResult<MemoryStats> {
        let mut sys = lock(&self.sys, "system")?;
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return Err(ProbeError::unavailable("memory totals not reported"));
        }
        Ok(MemoryStats {
            total,
            used: sys.used_memory(),
            free: sys.free_memory(),
            available: sys.available_memory(),
        })
    }

    fn swap_stats(&self) -> ProbeResult<SwapStats> {
        let mut sys = lock(&self.sys, "system")?;
        sys.refresh_memory();
        Ok(SwapStats {
            total: sys.total_swap(),
            used: sys.used_swap(),
            free: sys.free_swap(),
        })
    }

    #[instrument(level = "debug", skip(self), fields(probe = "sysinfo"))]
    fn disk_partitions(&self) -> ProbeResult<Vec<PartitionInfo>> {
        let mut disks = lock(&self.disks, "disks")?;
        disks.refresh(true);
        Ok(disks
            .list()
            .iter()
            .map(|d| PartitionInfo {
                device: d.name().to_string_lossy().into_owned(),
                mountpoint: d.mount_point().to_string_lossy().into_owned(),
                fs_type: d.file_system().to_string_lossy().into_owned(),
            })
            .collect())
    }

    /// Reads the values loaded by the last `disk_partitions` refresh.
    ///
    /// sysinfo only reports total and available space, so `used` is derived as
    /// `total - available` and `used + free == total` always holds here. Blocks reserved
    /// for root count as used.
    fn disk_usage(&self, mountpoint: &str) -> ProbeResult<DiskUsage> {
        let disks = lock(&self.disks, "disks")?;
        let disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point().to_string_lossy() == mountpoint)
            .ok_or_else(|| ProbeError::transient(format!("{} is no longer mounted", mountpoint)))?;
        let total = disk.total_space();
        if total == 0 {
            return Err(ProbeError::unavailable(format!(
                "{} reports no capacity",
                mountpoint
            )));
        }
        let free = disk.available_space();
        Ok(DiskUsage {
            total,
            used: total.saturating_sub(free),
            free,
        })
    }

    fn network_interface_stats(&self) -> ProbeResult<Vec<InterfaceStats>> {
        let mut networks = lock(&self.networks, "networks")?;
        networks.refresh(true);
        let mut interfaces: Vec<InterfaceStats> = networks
            .list()
            .iter()
            .map(|(name, data)| {
                let link = linux::read_link_facts(name);
                let mac = data.mac_address().to_string();
                InterfaceStats {
                    name: name.clone(),
                    is_up: link.is_up,
                    speed_mbps: link.speed_mbps,
                    duplex: link.duplex,
                    mtu: link.mtu,
                    mac_address: (mac != EMPTY_MAC).then_some(mac),
                    ipv4: data
                        .ip_networks()
                        .iter()
                        .filter(|n| n.addr.is_ipv4())
                        .map(|n| n.addr.to_string())
                        .collect(),
                    ipv6: data
                        .ip_networks()
                        .iter()
                        .filter(|n| n.addr.is_ipv6())
                        .map(|n| n.addr.to_string())
                        .collect(),
                }
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(interfaces)
    }

    fn network_io_counters(&self) -> ProbeResult<NetworkCounters> {
        let mut networks = lock(&self.networks, "networks")?;
        networks.refresh(true);
        if networks.list().is_empty() {
            return Err(ProbeError::unavailable("no network interfaces"));
        }
        Ok(networks
            .list()
            .values()
            .fold(NetworkCounters::default(), |acc, data| NetworkCounters {
                bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
                bytes_recv: acc.bytes_recv.saturating_add(data.total_received()),
                packets_sent: acc
                    .packets_sent
                    .saturating_add(data.total_packets_transmitted()),
                packets_recv: acc
                    .packets_recv
                    .saturating_add(data.total_packets_received()),
            }))
    }

    #[instrument(level = "debug", skip(self), fields(probe = "sysinfo"))]
    fn process_list(&self, query: &ProcessQuery) -> ProbeResult<Vec<u32>> {
        {
            let mut sys = lock(&self.sys, "system")?;
            Self::refresh_selected(&mut sys, &query.selection);
        }
        if let Some(window) = query.cpu_sampling.window() {
            // Second observation so first-seen processes get a real CPU figure.
            // The lock is released while sleeping so other collectors keep going.
            std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
            let mut sys = lock(&self.sys, "system")?;
            Self::refresh_selected(&mut sys, &query.selection);
        }
        let sys = lock(&self.sys, "system")?;
        let pids = match &query.selection {
            ProcessSelection::All => sys.processes().keys().map(|p| p.as_u32()).collect(),
            ProcessSelection::Only(pids) => pids
                .iter()
                .copied()
                .filter(|p| sys.process(Pid::from_u32(*p)).is_some())
                .collect(),
        };
        Ok(pids)
    }

    fn process_detail(&self, pid: u32) -> ProbeResult<RawProcess> {
        let sys = lock(&self.sys, "system")?;
        let process = sys
            .process(Pid::from_u32(pid))
            .ok_or_else(|| ProbeError::transient(format!("process {} vanished", pid)))?;
        let start_time = process.start_time();
        Ok(RawProcess {
            pid,
            name: process.name().to_string_lossy().into_owned(),
            cpu_percent: (process.cpu_usage() as f64).max(0.0),
            memory_bytes: process.memory(),
            start_time: (start_time > 0).then_some(start_time),
        })
    }

    #[instrument(level = "debug", skip(self), fields(probe = "sysinfo"))]
    fn gpu_list(&self) -> ProbeResult<Vec<GpuDevice>> {
        let nvidia = nvidia::query_nvidia_smi();
        if let Ok(devices) = &nvidia
            && !devices.is_empty()
        {
            return nvidia;
        }
        if let Some(devices) = linux::read_drm_gpus() {
            return Ok(devices);
        }
        match nvidia {
            Err(e @ ProbeError::Transient(_)) => Err(e),
            Ok(devices) => Ok(devices),
            Err(_) => Err(ProbeError::unavailable("no GPU driver interface found")),
        }
    }

    fn os_identity(&self) -> ProbeResult<OsIdentity> {
        let sys = lock(&self.sys, "system")?;
        let cpu_model = linux::read_cpu_model().or_else(|| {
            sys.cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|s| !s.is_empty() && s != "cpu0")
        });
        Ok(OsIdentity {
            name: Some(linux::read_os_type()),
            release: System::kernel_version(),
            version: linux::read_kernel_build(),
            distribution: linux::read_os_pretty_name().or_else(System::long_os_version),
            architecture: Some(std::env::consts::ARCH.to_string()),
            hostname: System::host_name(),
            cpu_model,
        })
    }

    fn boot_time(&self) -> ProbeResult<u64> {
        match System::boot_time() {
            0 => Err(ProbeError::unavailable("boot time not reported")),
            t => Ok(t),
        }
    }

    /// A missing power_supply class is unavailable; any other read error is transient.
    fn battery_status(&self) -> ProbeResult<Option<BatteryStatus>> {
        Ok(linux::read_battery()?)
    }

    fn logged_in_users(&self) -> ProbeResult<Vec<UserSession>> {
        Ok(linux::read_utmp_sessions()?)
    }
}
