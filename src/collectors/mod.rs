//! Domain collectors.
//!
//! Each collector wraps one or more [`PlatformProbe`](crate::probe::PlatformProbe) calls into a single domain
//! snapshot. Fields are fetched independently: a failing probe call nulls its field
//! and is recorded in the returned [`DomainError`], the rest of the snapshot is kept.
//! Collectors hold no state and never fail as a whole.

pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod process;
pub mod system;

use crate::error::{Domain, DomainError, FieldFailure, ProbeError, ProbeResult};
use crate::models::ProcessCpuMode;

/// Knobs shared by the collectors of one aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorConfig {
    pub process_cpu: ProcessCpuMode,
}

/// Field failures recorded while one collector runs.
pub(crate) struct FailureLog {
    domain: Domain,
    failures: Vec<FieldFailure>,
}

impl FailureLog {
    pub(crate) fn new(domain: Domain) -> Self {
        Self {
            domain,
            failures: Vec::new(),
        }
    }

    /// Value on success; on failure the field is recorded and `None` returned.
    pub(crate) fn take<T>(&mut self, field: &str, result: ProbeResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.record(field, &e);
                None
            }
        }
    }

    /// Unsupported facts are recorded silently; transient ones are logged.
    pub(crate) fn record(&mut self, field: &str, err: &ProbeError) {
        if let ProbeError::Transient(reason) = err {
            tracing::warn!(domain = %self.domain, field, reason = %reason, "probe failed");
        }
        self.failures.push(FieldFailure {
            field: field.to_string(),
            kind: err.kind(),
            reason: err.reason().to_string(),
        });
    }

    pub(crate) fn finish(self) -> Option<DomainError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(DomainError {
                domain: self.domain,
                failures: self.failures,
            })
        }
    }
}
