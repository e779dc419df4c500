// Network interface and counter models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Full,
    Half,
    #[serde(other)]
    Unknown,
}

impl Duplex {
    /// Parse the kernel's duplex string (e.g. "full", "half").
    pub fn from_sysfs(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "full" => Duplex::Full,
            "half" => Duplex::Half,
            _ => Duplex::Unknown,
        }
    }
}

/// Static per-interface facts. `name` is unique within one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceInfo {
    pub name: String,
    pub is_up: Option<bool>,
    pub speed_mbps: Option<u64>,
    pub duplex: Duplex,
    pub mtu: Option<u32>,
    pub mac_address: Option<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

/// Counters cumulative since boot, summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub interfaces: Option<Vec<NetworkInterfaceInfo>>,
    pub counters: Option<NetworkCounters>,
}
