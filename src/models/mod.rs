// Domain snapshot models

mod gpu;
mod network;
mod process;
mod storage;
mod system;

pub use gpu::{GpuDevice, GpuSnapshot};
pub use network::{Duplex, NetworkCounters, NetworkInterfaceInfo, NetworkSnapshot};
pub use process::{ProcessCpuMode, ProcessRecord, ProcessSnapshot};
pub use storage::{DiskSnapshot, PartitionUsage};
pub use system::{
    BatteryStatus, CpuFrequency, CpuSnapshot, DerivedRates, MemorySnapshot, PolledSnapshot,
    SystemIdentity, SystemSnapshot, UserSession,
};
