// Disk collector: per-partition usage plus a sum over partitions that reported

use super::FailureLog;
use crate::error::{Domain, DomainError};
use crate::models::{DiskSnapshot, PartitionUsage};
use crate::probe::PlatformProbe;
use crate::units::Capacity;

const ROOT_MOUNT: &str = "/";

/// A partition whose usage probe fails is left out of both the list and the total,
/// and its mountpoint is listed in `skipped`.
pub fn collect(probe: &dyn PlatformProbe) -> (DiskSnapshot, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::Disk);

    let Some(partitions) = log.take("partitions", probe.disk_partitions()) else {
        return (DiskSnapshot::default(), log.finish());
    };

    let mut reported = Vec::with_capacity(partitions.len());
    let mut skipped = Vec::new();
    for partition in partitions {
        match probe.disk_usage(&partition.mountpoint) {
            Ok(usage) => {
                let capacity = Capacity::from_bytes(usage.total, usage.used, usage.free);
                reported.push(PartitionUsage {
                    device: partition.device,
                    mountpoint: partition.mountpoint,
                    fs_type: partition.fs_type,
                    usage_percent: capacity.usage_percent(),
                    capacity,
                });
            }
            Err(e) => {
                log.record(&format!("partition:{}", partition.mountpoint), &e);
                skipped.push(partition.mountpoint);
            }
        }
    }

    let total = Capacity::sum(reported.iter().map(|p| &p.capacity));
    let root_usage_percent = reported
        .iter()
        .find(|p| p.mountpoint == ROOT_MOUNT)
        .and_then(|p| p.usage_percent);

    let snapshot = DiskSnapshot {
        partitions: Some(reported),
        total: Some(total),
        root_usage_percent,
        skipped,
    };
    (snapshot, log.finish())
}
