// Domain collector tests against a scripted probe

mod common;

use common::{FakeProbe, GB, partition, raw_process};
use hostscope::collectors;
use hostscope::error::{Domain, FailureKind, ProbeError};
use hostscope::models::{BatteryStatus, ProcessCpuMode};
use hostscope::probe::{CpuUsage, DiskUsage, ProcessSelection};
use std::time::Duration;

#[test]
fn cpu_collects_every_field() {
    let probe = FakeProbe::healthy();
    let (cpu, err) = collectors::cpu::collect(&probe);
    assert!(err.is_none());
    assert_eq!(cpu.logical_cores, Some(4));
    assert_eq!(cpu.physical_cores, Some(2));
    assert_eq!(cpu.per_core_usage, Some(vec![10.0, 20.0, 30.0, 40.0]));
    assert_eq!(cpu.total_usage, Some(25.0));
    assert_eq!(cpu.model.as_deref(), Some("Fake CPU @ 2.40GHz"));
    let freq = cpu.frequency.unwrap();
    assert_eq!(freq.current_mhz, Some(2400.0));
    assert_eq!(freq.max_mhz, Some(3600.0));
}

#[test]
fn cpu_per_core_length_mismatch_nulls_field() {
    let mut probe = FakeProbe::healthy();
    probe.per_core = Ok(CpuUsage::PerCore(vec![10.0, 20.0, 30.0]));
    let (cpu, err) = collectors::cpu::collect(&probe);
    assert_eq!(cpu.per_core_usage, None);
    assert_eq!(cpu.logical_cores, Some(4));
    let err = err.expect("mismatch is recorded");
    assert_eq!(err.domain, Domain::Cpu);
    let failure = err.failure("per_core_usage").unwrap();
    assert_eq!(failure.kind, FailureKind::Transient);
    // Aggregate usage is independent of the per-core reading
    assert_eq!(cpu.total_usage, Some(25.0));
}

#[test]
fn cpu_frequency_unsupported_is_null_and_recorded_as_unavailable() {
    let mut probe = FakeProbe::healthy();
    probe.frequency = Err(ProbeError::unavailable("no cpufreq"));
    let (cpu, err) = collectors::cpu::collect(&probe);
    assert!(cpu.frequency.is_none());
    assert_eq!(cpu.per_core_usage.as_ref().map(Vec::len), Some(4));
    let err = err.unwrap();
    assert_eq!(err.failure("frequency").unwrap().kind, FailureKind::Unavailable);
}

#[test]
fn cpu_usage_is_clamped_to_percent_range() {
    let mut probe = FakeProbe::healthy();
    probe.per_core = Ok(CpuUsage::PerCore(vec![-3.0, 101.0, 50.04, f64::NAN]));
    probe.total = Ok(CpuUsage::Total(140.0));
    let (cpu, _) = collectors::cpu::collect(&probe);
    assert_eq!(cpu.per_core_usage, Some(vec![0.0, 100.0, 50.0, 0.0]));
    assert_eq!(cpu.total_usage, Some(100.0));
}

#[test]
fn memory_percent_uses_available() {
    let probe = FakeProbe::healthy();
    let (mem, err) = collectors::memory::collect(&probe);
    assert!(err.is_none());
    let memory = mem.memory.unwrap();
    assert_eq!(memory.total_gb, 16.0);
    assert_eq!(memory.used_gb, 6.0);
    assert_eq!(memory.free_gb, 8.0);
    // (16 - 10) / 16
    assert_eq!(mem.usage_percent, Some(37.5));
    assert_eq!(mem.swap_usage_percent, Some(25.0));
}

#[test]
fn memory_without_swap_has_null_swap_percent() {
    let mut probe = FakeProbe::healthy();
    probe.swap = Ok(hostscope::probe::SwapStats {
        total: 0,
        used: 0,
        free: 0,
    });
    let (mem, err) = collectors::memory::collect(&probe);
    assert!(err.is_none());
    assert_eq!(mem.swap.unwrap().total_bytes, 0);
    assert_eq!(mem.swap_usage_percent, None);
}

#[test]
fn disk_total_sums_only_reporting_partitions() {
    let mut probe = FakeProbe::healthy();
    probe.partitions = Ok(vec![partition("/"), partition("/home"), partition("/mnt/usb")]);
    probe.usage.insert(
        "/mnt/usb".into(),
        Err(ProbeError::transient("permission denied")),
    );

    let (disk, err) = collectors::disk::collect(&probe);

    let partitions = disk.partitions.unwrap();
    assert_eq!(partitions.len(), 2);
    assert!(partitions.iter().all(|p| p.mountpoint != "/mnt/usb"));
    let total = disk.total.unwrap();
    assert_eq!(total.total_bytes, 300 * GB);
    assert_eq!(total.used_bytes, 90 * GB);
    assert_eq!(total.free_bytes, 210 * GB);
    assert_eq!(total.total_gb, 300.0);
    assert_eq!(disk.skipped, vec!["/mnt/usb".to_string()]);
    assert_eq!(disk.root_usage_percent, Some(40.0));

    let err = err.unwrap();
    assert_eq!(err.domain, Domain::Disk);
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].field, "partition:/mnt/usb");
}

#[test]
fn disk_listing_failure_nulls_domain_fields() {
    let mut probe = FakeProbe::healthy();
    probe.partitions = Err(ProbeError::transient("mtab unreadable"));
    let (disk, err) = collectors::disk::collect(&probe);
    assert!(disk.partitions.is_none());
    assert!(disk.total.is_none());
    assert!(err.unwrap().failure("partitions").is_some());
}

#[test]
fn disk_zero_sized_partition_has_null_percent() {
    let mut probe = FakeProbe::healthy();
    probe.partitions = Ok(vec![partition("/proc")]);
    probe.usage.insert(
        "/proc".into(),
        Ok(DiskUsage {
            total: 0,
            used: 0,
            free: 0,
        }),
    );
    let (disk, err) = collectors::disk::collect(&probe);
    assert!(err.is_none());
    assert_eq!(disk.partitions.unwrap()[0].usage_percent, None);
    assert_eq!(disk.root_usage_percent, None);
}

#[test]
fn network_interface_names_are_unique() {
    let mut probe = FakeProbe::healthy();
    let mut interfaces = probe.interfaces.clone().unwrap();
    let mut dup = interfaces[0].clone();
    dup.mtu = Some(9000);
    interfaces.push(dup);
    probe.interfaces = Ok(interfaces);

    let (net, err) = collectors::network::collect(&probe);
    assert!(err.is_none());
    let interfaces = net.interfaces.unwrap();
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].mtu, Some(1500));
    assert_eq!(net.counters.unwrap().bytes_sent, 1000);
}

#[test]
fn network_unknown_link_state_stays_null() {
    let mut probe = FakeProbe::healthy();
    let mut interfaces = probe.interfaces.clone().unwrap();
    interfaces[0].is_up = None;
    probe.interfaces = Ok(interfaces);

    let (net, err) = collectors::network::collect(&probe);
    assert!(err.is_none());
    assert_eq!(net.interfaces.unwrap()[0].is_up, None);
}

#[test]
fn network_counter_failure_keeps_interfaces() {
    let probe = FakeProbe::healthy().with_counters([Err(ProbeError::transient("busy"))]);
    let (net, err) = collectors::network::collect(&probe);
    assert!(net.counters.is_none());
    assert_eq!(net.interfaces.unwrap().len(), 1);
    assert!(err.unwrap().failure("counters").is_some());
}

#[test]
fn process_exiting_mid_enumeration_is_dropped_not_fatal() {
    let mut probe = FakeProbe::healthy();
    probe.pids = Ok(vec![42, 7, 1]);
    // pid 7 is listed but has no detail: it exited after listing
    let (snap, err) = collectors::process::collect(&probe, ProcessCpuMode::Instant);
    assert!(err.is_none());
    let processes = snap.processes.unwrap();
    assert_eq!(
        processes.iter().map(|p| p.pid).collect::<Vec<_>>(),
        vec![1, 42]
    );
    assert_eq!(snap.dropped, 1);
    assert_eq!(processes[0].name, "init");
    assert_eq!(processes[0].cpu_percent, 1.3);
}

#[test]
fn process_enumeration_failure_nulls_list() {
    let mut probe = FakeProbe::healthy();
    probe.pids = Err(ProbeError::transient("procfs busy"));
    let (snap, err) = collectors::process::collect(&probe, ProcessCpuMode::Instant);
    assert!(snap.processes.is_none());
    assert_eq!(err.unwrap().domain, Domain::Process);
}

#[test]
fn process_collector_forwards_cpu_sampling_mode() {
    let probe = FakeProbe::healthy();
    let mode = ProcessCpuMode::blocking(Duration::from_millis(250));
    let (snap, _) = collectors::process::collect(&probe, mode);
    assert_eq!(snap.cpu_sampling, mode);
    let queries = probe.process_queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].selection, ProcessSelection::All);
    assert_eq!(queries[0].cpu_sampling.window(), Some(Duration::from_millis(250)));
}

#[test]
fn process_inspect_single_pid() {
    let mut probe = FakeProbe::healthy();
    probe.processes.insert(99, Ok(raw_process(99, "busy")));
    probe.pids = Ok(vec![1, 42, 99]);
    let record = collectors::process::inspect(&probe, 99, ProcessCpuMode::Instant).unwrap();
    assert_eq!(record.pid, 99);
    assert_eq!(record.name, "busy");
    assert_eq!(record.memory_human(), "4.00 MB");
    let queries = probe.process_queries.lock().unwrap();
    assert_eq!(queries[0].selection, ProcessSelection::Only(vec![99]));
}

#[test]
fn process_inspect_missing_pid_is_transient() {
    let probe = FakeProbe::healthy();
    let err = collectors::process::inspect(&probe, 12345, ProcessCpuMode::Instant).unwrap_err();
    assert!(matches!(err, ProbeError::Transient(_)));
}

#[test]
fn gpu_absent_collapses_whole_domain() {
    let mut probe = FakeProbe::healthy();
    probe.gpus = Err(ProbeError::unavailable("nvidia-smi not found"));
    let (gpu, err) = collectors::gpu::collect(&probe);
    assert!(!gpu.is_available());
    let err = err.unwrap();
    assert!(err.is_whole_domain());
    assert_eq!(err.failures[0].kind, FailureKind::Unavailable);
}

#[test]
fn gpu_empty_list_is_unavailable() {
    let mut probe = FakeProbe::healthy();
    probe.gpus = Ok(vec![]);
    let (gpu, err) = collectors::gpu::collect(&probe);
    assert!(gpu.devices.is_none());
    assert!(err.unwrap().is_whole_domain());
}

#[test]
fn gpu_present_reports_primary_device() {
    let probe = FakeProbe::healthy();
    let (gpu, err) = collectors::gpu::collect(&probe);
    assert!(err.is_none());
    let primary = gpu.primary().unwrap();
    assert_eq!(primary.load_percent, Some(35.0));
    assert_eq!(primary.memory_used_mb, Some(512.0));
    assert_eq!(primary.temperature_celsius, Some(55.0));
}

#[test]
fn system_identity_uptime_from_boot_time() {
    let probe = FakeProbe::healthy();
    let (sys, err) = collectors::system::collect_at(&probe, 1_700_003_723);
    assert!(err.is_none());
    assert_eq!(sys.uptime_secs, Some(3723));
    assert_eq!(sys.uptime_display.as_deref(), Some("1h 2m 3s"));
    assert_eq!(sys.hostname.as_deref(), Some("testhost"));
    assert_eq!(sys.os_details().as_deref(), Some("Linux 6.1.0 #1 SMP"));
    assert_eq!(sys.user.unwrap().name, "alice");
    assert_eq!(
        sys.battery,
        Some(BatteryStatus {
            percent: 87.0,
            power_plugged: Some(true)
        })
    );
}

#[test]
fn system_no_battery_is_null_without_failure() {
    let mut probe = FakeProbe::healthy();
    probe.battery = Ok(None);
    let (sys, err) = collectors::system::collect_at(&probe, 1_700_000_010);
    assert!(sys.battery.is_none());
    assert!(err.is_none());
}

#[test]
fn system_battery_probe_failure_is_recorded() {
    let mut probe = FakeProbe::healthy();
    probe.battery = Err(ProbeError::transient("power_supply read failed"));
    let (sys, err) = collectors::system::collect_at(&probe, 1_700_000_010);
    assert!(sys.battery.is_none());
    let err = err.unwrap();
    assert_eq!(err.failure("battery").unwrap().kind, FailureKind::Transient);
    // The rest of the identity is still filled
    assert_eq!(sys.architecture.as_deref(), Some("x86_64"));
}

#[test]
fn system_battery_permission_error_is_transient_not_unavailable() {
    let mut probe = FakeProbe::healthy();
    probe.battery = Err(ProbeError::from(std::io::Error::from(
        std::io::ErrorKind::PermissionDenied,
    )));
    probe.users = Err(ProbeError::from(std::io::Error::from(std::io::ErrorKind::NotFound)));
    let (sys, err) = collectors::system::collect_at(&probe, 1_700_000_010);
    assert!(sys.battery.is_none());
    assert!(sys.user.is_none());
    let err = err.unwrap();
    assert_eq!(err.failure("battery").unwrap().kind, FailureKind::Transient);
    assert_eq!(err.failure("user").unwrap().kind, FailureKind::Unavailable);
}

#[cfg(target_os = "linux")]
#[test]
fn live_host_identity_reads_like_uname() {
    let host = hostscope::probe::SysinfoProbe::new();
    let (sys, _) = collectors::system::collect(&host);
    assert_eq!(sys.os_name.as_deref(), Some("Linux"));
    let release = std::fs::read_to_string("/proc/sys/kernel/osrelease").unwrap();
    assert_eq!(sys.os_release.as_deref(), Some(release.trim()));
    assert!(sys.os_details().unwrap().starts_with("Linux "));
}

#[test]
fn system_headless_host_has_null_user() {
    let mut probe = FakeProbe::healthy();
    probe.users = Ok(vec![]);
    let (sys, err) = collectors::system::collect_at(&probe, 1_700_000_010);
    assert!(sys.user.is_none());
    assert!(err.is_none());
}

#[test]
fn system_boot_time_in_future_clamps_uptime() {
    let probe = FakeProbe::healthy();
    let (sys, _) = collectors::system::collect_at(&probe, 1_600_000_000);
    assert_eq!(sys.uptime_secs, Some(0));
}
