// Snapshot aggregator: runs every domain collector and assembles one SystemSnapshot

use std::future::Future;
use std::sync::Arc;

use crate::collectors::{self, CollectorConfig};
use crate::error::{Domain, DomainError, ProbeError};
use crate::models::SystemSnapshot;
use crate::probe::PlatformProbe;

/// Something that yields complete snapshots; the polling loop is generic over it.
pub trait SnapshotSource: Send + Sync {
    fn collect(&self) -> impl Future<Output = SystemSnapshot> + Send;
}

#[derive(Clone)]
pub struct Aggregator {
    probe: Arc<dyn PlatformProbe>,
    config: CollectorConfig,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}

/// Runs one collector on the blocking pool. A panicking collector yields its domain's
/// default (all-null) snapshot plus a whole-domain failure.
async fn run_blocking<T, F>(
    probe: Arc<dyn PlatformProbe>,
    domain: Domain,
    collect: F,
) -> (T, Option<DomainError>)
where
    T: Default + Send + 'static,
    F: FnOnce(&dyn PlatformProbe) -> (T, Option<DomainError>) + Send + 'static,
{
    match tokio::task::spawn_blocking(move || collect(probe.as_ref())).await {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(domain = %domain, error = %e, "collector task failed");
            (
                T::default(),
                Some(DomainError::whole_domain(
                    domain,
                    &ProbeError::transient(format!("collector task failed: {}", e)),
                )),
            )
        }
    }
}

impl Aggregator {
    pub fn new(probe: Arc<dyn PlatformProbe>, config: CollectorConfig) -> Self {
        Self { probe, config }
    }

    pub fn probe(&self) -> &Arc<dyn PlatformProbe> {
        &self.probe
    }

    pub fn config(&self) -> CollectorConfig {
        self.config
    }

    /// Calls the collectors one after another on the current thread.
    pub fn collect_sequential(&self) -> SystemSnapshot {
        let captured_at_ms = now_ms();
        let probe = self.probe.as_ref();
        let process_cpu = self.config.process_cpu;
        let cpu = collectors::cpu::collect(probe);
        let memory = collectors::memory::collect(probe);
        let disk = collectors::disk::collect(probe);
        let network = collectors::network::collect(probe);
        let processes = collectors::process::collect(probe, process_cpu);
        let gpu = collectors::gpu::collect(probe);
        let system = collectors::system::collect(probe);
        assemble(
            captured_at_ms,
            cpu,
            memory,
            disk,
            network,
            processes,
            gpu,
            system,
        )
    }

    /// Runs each collector as its own blocking task and joins them. Collectors touch
    /// disjoint OS resources and share no mutable state.
    pub async fn collect_concurrent(&self) -> SystemSnapshot {
        let captured_at_ms = now_ms();
        let process_cpu = self.config.process_cpu;
        let p = || self.probe.clone();
        let (cpu, memory, disk, network, mut processes, gpu, system) = tokio::join!(
            run_blocking(p(), Domain::Cpu, collectors::cpu::collect),
            run_blocking(p(), Domain::Memory, collectors::memory::collect),
            run_blocking(p(), Domain::Disk, collectors::disk::collect),
            run_blocking(p(), Domain::Network, collectors::network::collect),
            run_blocking(p(), Domain::Process, move |probe| {
                collectors::process::collect(probe, process_cpu)
            }),
            run_blocking(p(), Domain::Gpu, collectors::gpu::collect),
            run_blocking(p(), Domain::System, collectors::system::collect),
        );
        processes.0.cpu_sampling = process_cpu;
        assemble(
            captured_at_ms,
            cpu,
            memory,
            disk,
            network,
            processes,
            gpu,
            system,
        )
    }
}

impl SnapshotSource for Aggregator {
    async fn collect(&self) -> SystemSnapshot {
        self.collect_concurrent().await
    }
}

type Part<T> = (T, Option<DomainError>);

#[allow(clippy::too_many_arguments)]
fn assemble(
    captured_at_ms: u64,
    cpu: Part<crate::models::CpuSnapshot>,
    memory: Part<crate::models::MemorySnapshot>,
    disk: Part<crate::models::DiskSnapshot>,
    network: Part<crate::models::NetworkSnapshot>,
    processes: Part<crate::models::ProcessSnapshot>,
    gpu: Part<crate::models::GpuSnapshot>,
    system: Part<crate::models::SystemIdentity>,
) -> SystemSnapshot {
    let errors: Vec<DomainError> = [cpu.1, memory.1, disk.1, network.1, processes.1, gpu.1, system.1]
        .into_iter()
        .flatten()
        .collect();
    SystemSnapshot {
        captured_at_ms,
        cpu: cpu.0,
        memory: memory.0,
        disk: disk.0,
        network: network.0,
        processes: processes.0,
        gpu: gpu.0,
        system: system.0,
        errors,
    }
}
