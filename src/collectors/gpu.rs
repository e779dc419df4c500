// GPU collector: best effort, whole domain collapses when no device is usable

use crate::error::{Domain, DomainError, ProbeError};
use crate::models::GpuSnapshot;
use crate::probe::PlatformProbe;

pub fn collect(probe: &dyn PlatformProbe) -> (GpuSnapshot, Option<DomainError>) {
    match probe.gpu_list() {
        Ok(devices) if !devices.is_empty() => (
            GpuSnapshot {
                devices: Some(devices),
            },
            None,
        ),
        Ok(_) => (
            GpuSnapshot::unavailable(),
            Some(DomainError::whole_domain(
                Domain::Gpu,
                &ProbeError::unavailable("no GPU detected"),
            )),
        ),
        Err(e) => {
            if let ProbeError::Transient(reason) = &e {
                tracing::warn!(domain = "gpu", reason = %reason, "probe failed");
            }
            (
                GpuSnapshot::unavailable(),
                Some(DomainError::whole_domain(Domain::Gpu, &e)),
            )
        }
    }
}
