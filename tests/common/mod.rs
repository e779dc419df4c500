// Shared test helpers: a scriptable probe and a slow snapshot source
#![allow(dead_code)]

use hostscope::aggregator::{Aggregator, SnapshotSource};
use hostscope::collectors::CollectorConfig;
use hostscope::error::{ProbeError, ProbeResult};
use hostscope::models::*;
use hostscope::probe::*;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

pub const GB: u64 = 1024 * 1024 * 1024;

/// Every fact is a canned result; tests overwrite the fields they care about.
pub struct FakeProbe {
    pub counts: ProbeResult<CpuCounts>,
    pub frequency: ProbeResult<RawCpuFrequency>,
    pub per_core: ProbeResult<CpuUsage>,
    pub total: ProbeResult<CpuUsage>,
    pub memory: ProbeResult<MemoryStats>,
    pub swap: ProbeResult<SwapStats>,
    pub partitions: ProbeResult<Vec<PartitionInfo>>,
    pub usage: HashMap<String, ProbeResult<DiskUsage>>,
    pub interfaces: ProbeResult<Vec<InterfaceStats>>,
    /// Popped one per call; the last entry repeats.
    pub counters: Mutex<VecDeque<ProbeResult<NetworkCounters>>>,
    pub pids: ProbeResult<Vec<u32>>,
    pub processes: HashMap<u32, ProbeResult<RawProcess>>,
    pub gpus: ProbeResult<Vec<GpuDevice>>,
    pub os: ProbeResult<OsIdentity>,
    pub boot: ProbeResult<u64>,
    pub battery: ProbeResult<Option<BatteryStatus>>,
    pub users: ProbeResult<Vec<UserSession>>,
    pub process_queries: Mutex<Vec<ProcessQuery>>,
    pub terminated: Mutex<Vec<u32>>,
    pub counter_calls: AtomicUsize,
}

pub fn partition(mountpoint: &str) -> PartitionInfo {
    PartitionInfo {
        device: format!("/dev/fake{}", mountpoint.replace('/', "_")),
        mountpoint: mountpoint.to_string(),
        fs_type: "ext4".into(),
    }
}

pub fn raw_process(pid: u32, name: &str) -> RawProcess {
    RawProcess {
        pid,
        name: name.into(),
        cpu_percent: 1.25,
        memory_bytes: 4 * 1024 * 1024,
        start_time: Some(1_700_000_000),
    }
}

pub fn counters(bytes_sent: u64, bytes_recv: u64, packets_sent: u64, packets_recv: u64) -> NetworkCounters {
    NetworkCounters {
        bytes_sent,
        bytes_recv,
        packets_sent,
        packets_recv,
    }
}

impl FakeProbe {
    /// A 4-core machine with two disks, one NIC, two processes, one GPU and a battery.
    pub fn healthy() -> Self {
        let mut usage = HashMap::new();
        usage.insert(
            "/".to_string(),
            Ok(DiskUsage {
                total: 100 * GB,
                used: 40 * GB,
                free: 60 * GB,
            }),
        );
        usage.insert(
            "/home".to_string(),
            Ok(DiskUsage {
                total: 200 * GB,
                used: 50 * GB,
                free: 150 * GB,
            }),
        );
        let mut processes = HashMap::new();
        processes.insert(1, Ok(raw_process(1, "init")));
        processes.insert(42, Ok(raw_process(42, "worker")));

        Self {
            counts: Ok(CpuCounts {
                physical: Some(2),
                logical: 4,
            }),
            frequency: Ok(RawCpuFrequency {
                current: 2400.0,
                min: Some(800.0),
                max: Some(3600.0),
            }),
            per_core: Ok(CpuUsage::PerCore(vec![10.0, 20.0, 30.0, 40.0])),
            total: Ok(CpuUsage::Total(25.0)),
            memory: Ok(MemoryStats {
                total: 16 * GB,
                used: 6 * GB,
                free: 8 * GB,
                available: 10 * GB,
            }),
            swap: Ok(SwapStats {
                total: 2 * GB,
                used: GB / 2,
                free: GB + GB / 2,
            }),
            partitions: Ok(vec![partition("/"), partition("/home")]),
            usage,
            interfaces: Ok(vec![InterfaceStats {
                name: "eth0".into(),
                is_up: Some(true),
                speed_mbps: Some(1000),
                duplex: Duplex::Full,
                mtu: Some(1500),
                mac_address: Some("02:42:ac:11:00:02".into()),
                ipv4: vec!["10.0.0.2".into()],
                ipv6: vec![],
            }]),
            counters: Mutex::new(VecDeque::from([Ok(counters(1000, 2000, 10, 20))])),
            pids: Ok(vec![42, 1]),
            processes,
            gpus: Ok(vec![GpuDevice {
                index: 0,
                name: Some("Fake GPU".into()),
                load_percent: Some(35.0),
                memory_used_mb: Some(512.0),
                memory_total_mb: Some(8192.0),
                temperature_celsius: Some(55.0),
            }]),
            os: Ok(OsIdentity {
                name: Some("Linux".into()),
                release: Some("6.1.0".into()),
                version: Some("#1 SMP".into()),
                distribution: Some("Debian GNU/Linux 12 (bookworm)".into()),
                architecture: Some("x86_64".into()),
                hostname: Some("testhost".into()),
                cpu_model: Some("Fake CPU @ 2.40GHz".into()),
            }),
            boot: Ok(1_700_000_000),
            battery: Ok(Some(BatteryStatus {
                percent: 87.0,
                power_plugged: Some(true),
            })),
            users: Ok(vec![UserSession {
                name: "alice".into(),
                terminal: Some("pts/0".into()),
                host: None,
            }]),
            process_queries: Mutex::new(Vec::new()),
            terminated: Mutex::new(Vec::new()),
            counter_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_counters<I: IntoIterator<Item = ProbeResult<NetworkCounters>>>(self, script: I) -> Self {
        *self.counters.lock().unwrap() = script.into_iter().collect();
        self
    }

    pub fn into_aggregator(self) -> Aggregator {
        Aggregator::new(Arc::new(self), CollectorConfig::default())
    }
}

impl PlatformProbe for FakeProbe {
    fn cpu_counts(&self) -> ProbeResult<CpuCounts> {
        self.counts.clone()
    }

    fn cpu_frequency(&self) -> ProbeResult<RawCpuFrequency> {
        self.frequency.clone()
    }

    fn cpu_percent(&self, per_core: bool) -> ProbeResult<CpuUsage> {
        if per_core {
            self.per_core.clone()
        } else {
            self.total.clone()
        }
    }

    fn memory_stats(&self) -> ProbeResult<MemoryStats> {
        self.memory.clone()
    }

    fn swap_stats(&self) -> ProbeResult<SwapStats> {
        self.swap.clone()
    }

    fn disk_partitions(&self) -> ProbeResult<Vec<PartitionInfo>> {
        self.partitions.clone()
    }

    fn disk_usage(&self, mountpoint: &str) -> ProbeResult<DiskUsage> {
        self.usage
            .get(mountpoint)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::transient(format!("{} not mounted", mountpoint))))
    }

    fn network_interface_stats(&self) -> ProbeResult<Vec<InterfaceStats>> {
        self.interfaces.clone()
    }

    fn network_io_counters(&self) -> ProbeResult<NetworkCounters> {
        self.counter_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.counters.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ProbeError::unavailable("no counters scripted")))
        }
    }

    fn process_list(&self, query: &ProcessQuery) -> ProbeResult<Vec<u32>> {
        self.process_queries.lock().unwrap().push(query.clone());
        let pids = self.pids.clone()?;
        Ok(match &query.selection {
            ProcessSelection::All => pids,
            ProcessSelection::Only(only) => pids.into_iter().filter(|p| only.contains(p)).collect(),
        })
    }

    fn process_detail(&self, pid: u32) -> ProbeResult<RawProcess> {
        self.processes
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::transient(format!("process {} exited", pid))))
    }

    fn gpu_list(&self) -> ProbeResult<Vec<GpuDevice>> {
        self.gpus.clone()
    }

    fn os_identity(&self) -> ProbeResult<OsIdentity> {
        self.os.clone()
    }

    fn boot_time(&self) -> ProbeResult<u64> {
        self.boot.clone()
    }

    fn battery_status(&self) -> ProbeResult<Option<BatteryStatus>> {
        self.battery.clone()
    }

    fn logged_in_users(&self) -> ProbeResult<Vec<UserSession>> {
        self.users.clone()
    }
}

impl ProcessControl for FakeProbe {
    fn terminate_process(&self, pid: u32) -> ProbeResult<()> {
        if !self.processes.contains_key(&pid) {
            return Err(ProbeError::transient(format!("process {} not found", pid)));
        }
        self.terminated.lock().unwrap().push(pid);
        Ok(())
    }
}

/// Wraps an aggregator and takes `delay` of (tokio) time per collection, recording when
/// each collection started.
#[derive(Clone)]
pub struct SlowSource {
    pub aggregator: Aggregator,
    pub delay: Duration,
    pub starts: Arc<Mutex<Vec<Instant>>>,
}

impl SlowSource {
    pub fn new(aggregator: Aggregator, delay: Duration) -> Self {
        Self {
            aggregator,
            delay,
            starts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Collection start times relative to `origin`, in whole milliseconds.
    pub fn start_offsets_ms(&self, origin: Instant) -> Vec<u64> {
        self.starts
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(origin).as_millis() as u64)
            .collect()
    }
}

impl SnapshotSource for SlowSource {
    async fn collect(&self) -> SystemSnapshot {
        self.starts.lock().unwrap().push(Instant::now());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.aggregator.collect_sequential()
    }
}
