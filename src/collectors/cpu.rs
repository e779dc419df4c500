// CPU collector: core counts, frequency, per-core and aggregate usage

use super::FailureLog;
use crate::error::{Domain, DomainError, ProbeError};
use crate::models::{CpuFrequency, CpuSnapshot};
use crate::probe::{CpuUsage, PlatformProbe};
use crate::units;

pub fn collect(probe: &dyn PlatformProbe) -> (CpuSnapshot, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::Cpu);

    let counts = log.take("cores", probe.cpu_counts());
    let logical_cores = counts.map(|c| c.logical);

    let frequency = log
        .take("frequency", probe.cpu_frequency())
        .map(|f| CpuFrequency {
            current_mhz: Some(units::round_to(f.current, 1)),
            min_mhz: f.min.map(|v| units::round_to(v, 1)),
            max_mhz: f.max.map(|v| units::round_to(v, 1)),
        });

    let per_core = match log.take("per_core_usage", probe.cpu_percent(true)) {
        Some(CpuUsage::PerCore(v)) => Some(v),
        Some(CpuUsage::Total(_)) => {
            log.record(
                "per_core_usage",
                &ProbeError::unavailable("probe returned aggregate usage only"),
            );
            None
        }
        None => None,
    };
    // Per-core length must match the logical count reported in this same snapshot
    let per_core_usage = match (per_core, logical_cores) {
        (Some(v), Some(n)) if v.len() == n as usize => Some(
            v.into_iter()
                .map(|u| units::round_to(units::clamp_percent(u), 1))
                .collect(),
        ),
        (Some(v), Some(n)) => {
            log.record(
                "per_core_usage",
                &ProbeError::transient(format!(
                    "{} per-core readings for {} logical cores",
                    v.len(),
                    n
                )),
            );
            None
        }
        (Some(_), None) => {
            log.record(
                "per_core_usage",
                &ProbeError::unavailable("logical core count unknown"),
            );
            None
        }
        (None, _) => None,
    };

    let total_usage = match log.take("total_usage", probe.cpu_percent(false)) {
        Some(CpuUsage::Total(v)) => Some(v),
        Some(CpuUsage::PerCore(v)) if !v.is_empty() => Some(v.iter().sum::<f64>() / v.len() as f64),
        _ => None,
    }
    .map(|v| units::round_to(units::clamp_percent(v), 1));

    // The model string comes from the identity probe; its failures are recorded by the
    // system collector.
    let model = probe.os_identity().ok().and_then(|i| i.cpu_model);

    let snapshot = CpuSnapshot {
        model,
        physical_cores: counts.and_then(|c| c.physical),
        logical_cores,
        frequency,
        per_core_usage,
        total_usage,
    };
    (snapshot, log.finish())
}
