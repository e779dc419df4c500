// Error taxonomy: probe failures, per-domain failure records, polling configuration errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure returned by a single platform probe call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Not supported on this platform or hardware. The field is null; nothing is logged.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Permission denied, resource busy, process vanished. Logged at collector scope.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl ProbeError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        ProbeError::Unavailable(msg.into())
    }

    pub fn transient<S: Into<String>>(msg: S) -> Self {
        ProbeError::Transient(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Unavailable(_) => FailureKind::Unavailable,
            ProbeError::Transient(_) => FailureKind::Transient,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ProbeError::Unavailable(r) | ProbeError::Transient(r) => r,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::Unsupported => {
                ProbeError::Unavailable(e.to_string())
            }
            _ => ProbeError::Transient(e.to_string()),
        }
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Rejected polling parameters; the loop never reaches `Running`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("polling interval must be > 0, got {0:?}")]
    NonPositiveInterval(std::time::Duration),

    #[error("polling interval must be a positive number of seconds, got {0}")]
    InvalidIntervalSecs(f64),

    #[error("polling duration must be > 0 when set, got {0}")]
    InvalidDuration(String),
}

/// Telemetry domain a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Cpu,
    Memory,
    Disk,
    Network,
    Process,
    Gpu,
    System,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Memory => "memory",
            Domain::Disk => "disk",
            Domain::Network => "network",
            Domain::Process => "process",
            Domain::Gpu => "gpu",
            Domain::System => "system",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Unavailable,
    Transient,
}

/// One field that could not be filled in a domain snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFailure {
    pub field: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// All field failures recorded by one collector run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainError {
    pub domain: Domain,
    pub failures: Vec<FieldFailure>,
}

impl DomainError {
    /// Single-failure error covering the whole domain (e.g. no GPU, collector task panicked).
    pub fn whole_domain(domain: Domain, err: &ProbeError) -> Self {
        Self {
            domain,
            failures: vec![FieldFailure {
                field: "*".into(),
                kind: err.kind(),
                reason: err.reason().to_string(),
            }],
        }
    }

    pub fn failure(&self, field: &str) -> Option<&FieldFailure> {
        self.failures.iter().find(|f| f.field == field)
    }

    pub fn is_whole_domain(&self) -> bool {
        self.failures.iter().any(|f| f.field == "*")
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for failure in &self.failures {
            write!(f, " {} ({:?}: {})", failure.field, failure.kind, failure.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for DomainError {}
