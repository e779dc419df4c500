// Process collector: enumerate, then fetch each record independently

use super::FailureLog;
use crate::error::{Domain, DomainError, ProbeError, ProbeResult};
use crate::models::{ProcessCpuMode, ProcessRecord, ProcessSnapshot};
use crate::probe::{PlatformProbe, ProcessQuery, RawProcess};

fn record_from(raw: RawProcess) -> ProcessRecord {
    ProcessRecord {
        pid: raw.pid,
        name: raw.name,
        cpu_percent: crate::units::round_to(raw.cpu_percent.max(0.0), 1),
        memory_bytes: raw.memory_bytes,
        start_time: raw.start_time,
    }
}

/// All visible processes, sorted by pid. A process whose detail fetch fails (it exited
/// after listing, access denied) is dropped and counted, never fatal.
///
/// With [`ProcessCpuMode::Instant`] a process observed for the first time may show 0 %.
pub fn collect(
    probe: &dyn PlatformProbe,
    cpu_sampling: ProcessCpuMode,
) -> (ProcessSnapshot, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::Process);

    let Some(pids) = log.take("processes", probe.process_list(&ProcessQuery::all(cpu_sampling)))
    else {
        let snapshot = ProcessSnapshot {
            processes: None,
            dropped: 0,
            cpu_sampling,
        };
        return (snapshot, log.finish());
    };

    let mut records = Vec::with_capacity(pids.len());
    let mut dropped: u32 = 0;
    for pid in pids {
        match probe.process_detail(pid) {
            Ok(raw) => records.push(record_from(raw)),
            Err(e) => {
                dropped += 1;
                tracing::trace!(pid, error = %e, "process record dropped");
            }
        }
    }
    if dropped > 0 {
        tracing::debug!(domain = "process", dropped, "process records dropped");
    }
    records.sort_by_key(|r| r.pid);

    let snapshot = ProcessSnapshot {
        processes: Some(records),
        dropped,
        cpu_sampling,
    };
    (snapshot, log.finish())
}

/// Resource usage of one process. Not found is a transient failure: the pid may simply
/// have exited.
pub fn inspect(
    probe: &dyn PlatformProbe,
    pid: u32,
    cpu_sampling: ProcessCpuMode,
) -> ProbeResult<ProcessRecord> {
    let visible = probe.process_list(&ProcessQuery::single(pid, cpu_sampling))?;
    if !visible.contains(&pid) {
        return Err(ProbeError::transient(format!("process {} not found", pid)));
    }
    probe.process_detail(pid).map(record_from)
}
