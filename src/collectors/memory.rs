// Memory collector: RAM and swap, values reported as the probe gives them

use super::FailureLog;
use crate::error::{Domain, DomainError};
use crate::models::MemorySnapshot;
use crate::probe::PlatformProbe;
use crate::units::{self, Capacity};

pub fn collect(probe: &dyn PlatformProbe) -> (MemorySnapshot, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::Memory);

    let stats = log.take("memory", probe.memory_stats());
    // used + free may fall short of total (reserved/cached memory); not reconciled
    let memory = stats.map(|m| Capacity::from_bytes(m.total, m.used, m.free));
    let usage_percent =
        stats.and_then(|m| units::percent(m.total.saturating_sub(m.available), m.total));

    let swap_stats = log.take("swap", probe.swap_stats());
    let swap = swap_stats.map(|s| Capacity::from_bytes(s.total, s.used, s.free));
    // No swap configured reads as a zero capacity with a null percentage
    let swap_usage_percent = swap_stats.and_then(|s| units::percent(s.used, s.total));

    let snapshot = MemorySnapshot {
        memory,
        usage_percent,
        swap,
        swap_usage_percent,
    };
    (snapshot, log.finish())
}
