// System identity collector: OS, boot time/uptime, battery, logged-in user

use super::FailureLog;
use crate::error::{Domain, DomainError};
use crate::models::SystemIdentity;
use crate::probe::PlatformProbe;
use crate::units;

pub fn collect(probe: &dyn PlatformProbe) -> (SystemIdentity, Option<DomainError>) {
    let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
    collect_at(probe, now_secs)
}

/// Same as [`collect`] with an explicit "now" (seconds since the Unix epoch) for uptime.
pub fn collect_at(probe: &dyn PlatformProbe, now_secs: u64) -> (SystemIdentity, Option<DomainError>) {
    let mut log = FailureLog::new(Domain::System);

    let os = log.take("os_identity", probe.os_identity());
    let boot_time = log.take("boot_time", probe.boot_time());
    let uptime_secs = boot_time.map(|boot| now_secs.saturating_sub(boot));
    // Ok(None) means no battery: null without a failure record
    let battery = log.take("battery", probe.battery_status()).flatten();
    let user = log
        .take("user", probe.logged_in_users())
        .and_then(|sessions| sessions.into_iter().next());

    let os = os.unwrap_or_default();
    let identity = SystemIdentity {
        os_name: os.name,
        os_release: os.release,
        os_version: os.version,
        distribution: os.distribution,
        architecture: os.architecture,
        hostname: os.hostname,
        cpu_model: os.cpu_model,
        boot_time,
        uptime_secs,
        uptime_display: uptime_secs.map(|s| units::format_duration(s as f64)),
        battery,
        user,
    };
    (identity, log.finish())
}
