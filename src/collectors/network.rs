// Network collector: static interface facts and cumulative counters.
// Rates need two snapshots and are derived by the polling loop.

use std::collections::HashSet;

use super::FailureLog;
use crate::error::{Domain, DomainError};
use crate::models::{NetworkInterfaceInfo, NetworkSnapshot};
use crate::probe::PlatformProbe;

pub fn collect(probe: &dyn PlatformProbe) -> (NetworkSnapshot, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::Network);

    let interfaces = log
        .take("interfaces", probe.network_interface_stats())
        .map(|stats| {
            let mut seen = HashSet::new();
            stats
                .into_iter()
                .filter(|s| seen.insert(s.name.clone()))
                .map(|s| NetworkInterfaceInfo {
                    name: s.name,
                    is_up: s.is_up,
                    speed_mbps: s.speed_mbps,
                    duplex: s.duplex,
                    mtu: s.mtu,
                    mac_address: s.mac_address,
                    ipv4: s.ipv4,
                    ipv6: s.ipv6,
                })
                .collect::<Vec<_>>()
        });

    let counters = log.take("counters", probe.network_io_counters());

    (NetworkSnapshot { interfaces, counters }, log.finish())
}
