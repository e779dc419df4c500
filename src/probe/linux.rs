// Linux-specific helpers: /proc, /sys, /etc/os-release, utmp.
// Optional facts come back as None off Linux or when the file is missing. Battery and
// login records keep the io::Error so the caller can tell "absent" from "failed".
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use crate::models::{BatteryStatus, Duplex, GpuDevice, UserSession};

#[cfg(target_os = "linux")]
fn read_trimmed(path: &str) -> Option<String> {
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}

#[cfg(target_os = "linux")]
fn read_parsed<T: std::str::FromStr>(path: &str) -> Option<T> {
    read_trimmed(path)?.parse().ok()
}

/// Read first "model name" from /proc/cpuinfo. Prefer over sysinfo when it returns "cpu0" etc.
pub(super) fn read_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        for line in content.lines() {
            if line.starts_with("model name") {
                let name = line
                    .find(": ")
                    .map(|i| line[i + 2..].trim())
                    .filter(|s| !s.is_empty() && *s != "cpu0")?;
                return Some(name.to_string());
            }
        }
    }
    None
}

/// PRETTY_NAME (or NAME) from /etc/os-release.
pub(super) fn read_os_pretty_name() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        return parse_os_release(&content);
    }
    #[cfg(not(target_os = "linux"))]
    None
}

pub(super) fn parse_os_release(content: &str) -> Option<String> {
    for key in ["PRETTY_NAME=", "NAME="] {
        for line in content.lines() {
            if let Some(v) = line.strip_prefix(key) {
                let v = v.trim().trim_matches('"');
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

/// Kernel system name (`uname -s`). Falls back to the build target's OS family.
pub(super) fn read_os_type() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Some(name) = read_trimmed("/proc/sys/kernel/ostype") {
            return name;
        }
    }
    system_name_for(std::env::consts::OS)
}

pub(super) fn system_name_for(os: &str) -> String {
    match os {
        "linux" | "android" => "Linux".to_string(),
        "macos" | "ios" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        "openbsd" => "OpenBSD".to_string(),
        "netbsd" => "NetBSD".to_string(),
        other => other.to_string(),
    }
}

/// Kernel build string (`uname -v`).
pub(super) fn read_kernel_build() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        return read_trimmed("/proc/sys/kernel/version");
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// (min, max) scaling frequency of cpu0 in MHz. cpufreq reports kHz.
pub(super) fn read_cpu_freq_bounds() -> (Option<f64>, Option<f64>) {
    #[cfg(target_os = "linux")]
    {
        const BASE: &str = "/sys/devices/system/cpu/cpu0/cpufreq";
        let read_khz = |names: [&str; 2]| {
            names
                .iter()
                .find_map(|n| read_parsed::<u64>(&format!("{}/{}", BASE, n)))
                .map(|khz| khz as f64 / 1000.0)
        };
        return (
            read_khz(["scaling_min_freq", "cpuinfo_min_freq"]),
            read_khz(["scaling_max_freq", "cpuinfo_max_freq"]),
        );
    }
    #[cfg(not(target_os = "linux"))]
    (None, None)
}

/// Static link facts from /sys/class/net/<interface>.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LinkFacts {
    pub is_up: Option<bool>,
    pub speed_mbps: Option<u64>,
    pub duplex: Duplex,
    pub mtu: Option<u32>,
}

pub(super) fn read_link_facts(interface_name: &str) -> LinkFacts {
    #[cfg(target_os = "linux")]
    {
        let base = format!("/sys/class/net/{}", interface_name);
        // IFF_UP is bit 0 of the interface flags
        let is_up = read_trimmed(&format!("{}/flags", base))
            .and_then(|f| u32::from_str_radix(f.trim_start_matches("0x"), 16).ok())
            .map(|flags| flags & 0x1 != 0)
            .or_else(|| read_trimmed(&format!("{}/operstate", base)).map(|s| s == "up"));
        // speed is -1 when the driver doesn't know
        let speed_mbps = read_parsed::<i64>(&format!("{}/speed", base))
            .filter(|mbps| *mbps > 0)
            .map(|mbps| mbps as u64);
        let duplex = read_trimmed(&format!("{}/duplex", base))
            .map(|d| Duplex::from_sysfs(&d))
            .unwrap_or(Duplex::Unknown);
        let mtu = read_parsed::<u32>(&format!("{}/mtu", base));
        return LinkFacts {
            is_up,
            speed_mbps,
            duplex,
            mtu,
        };
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface_name;
        LinkFacts {
            is_up: None,
            speed_mbps: None,
            duplex: Duplex::Unknown,
            mtu: None,
        }
    }
}

/// GPUs exposed through DRM (amdgpu and friends). Cards whose driver exposes no
/// load, memory or temperature are left out. None when /sys/class/drm is missing.
pub(super) fn read_drm_gpus() -> Option<Vec<GpuDevice>> {
    #[cfg(target_os = "linux")]
    {
        let mut cards: Vec<(u32, std::path::PathBuf)> = std::fs::read_dir("/sys/class/drm")
            .ok()?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                let index = name.strip_prefix("card")?.parse::<u32>().ok()?;
                Some((index, e.path()))
            })
            .collect();
        cards.sort_by_key(|(i, _)| *i);

        let mut devices = Vec::new();
        for (index, path) in cards {
            let dev = path.join("device");
            let dev = dev.to_string_lossy();
            let load_percent =
                read_parsed::<f64>(&format!("{}/gpu_busy_percent", dev)).map(crate::units::clamp_percent);
            let to_mb = |b: u64| crate::units::round_to(b as f64 / (1024.0 * 1024.0), 2);
            let memory_used_mb = read_parsed::<u64>(&format!("{}/mem_info_vram_used", dev)).map(to_mb);
            let memory_total_mb = read_parsed::<u64>(&format!("{}/mem_info_vram_total", dev)).map(to_mb);
            let temperature_celsius = std::fs::read_dir(format!("{}/hwmon", dev))
                .ok()
                .and_then(|mut it| it.find_map(|e| e.ok()))
                .and_then(|hw| read_parsed::<i64>(&format!("{}/temp1_input", hw.path().to_string_lossy())))
                .map(|milli| milli as f64 / 1000.0);
            if load_percent.is_none()
                && memory_used_mb.is_none()
                && memory_total_mb.is_none()
                && temperature_celsius.is_none()
            {
                continue;
            }
            let name = std::fs::read_to_string(format!("{}/uevent", dev))
                .ok()
                .and_then(|u| {
                    u.lines()
                        .find_map(|l| l.strip_prefix("DRIVER=").map(|d| d.to_string()))
                });
            devices.push(GpuDevice {
                index,
                name,
                load_percent,
                memory_used_mb,
                memory_total_mb,
                temperature_celsius,
            });
        }
        return Some(devices);
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Battery state from /sys/class/power_supply. Ok(None) when no battery is present.
pub(super) fn read_battery() -> std::io::Result<Option<BatteryStatus>> {
    #[cfg(target_os = "linux")]
    {
        return read_battery_from(std::path::Path::new("/sys/class/power_supply"));
    }
    #[cfg(not(target_os = "linux"))]
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no power supply interface on this platform",
    ))
}

#[cfg(target_os = "linux")]
pub(super) fn read_battery_from(base: &std::path::Path) -> std::io::Result<Option<BatteryStatus>> {
    let entries: Vec<String> = std::fs::read_dir(base)?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_string_lossy().into_owned())
        .collect();

    let mains_online: Vec<bool> = entries
        .iter()
        .filter(|p| read_trimmed(&format!("{}/type", p)).as_deref() == Some("Mains"))
        .filter_map(|p| read_parsed::<u8>(&format!("{}/online", p)))
        .map(|v| v == 1)
        .collect();

    let Some(bat) = entries
        .iter()
        .find(|p| read_trimmed(&format!("{}/type", p)).as_deref() == Some("Battery"))
    else {
        return Ok(None);
    };

    let ratio = |now: &str, full: &str| -> Option<f64> {
        let n = read_parsed::<f64>(&format!("{}/{}", bat, now))?;
        let f = read_parsed::<f64>(&format!("{}/{}", bat, full))?;
        (f > 0.0).then(|| n / f * 100.0)
    };
    let Some(percent) = read_parsed::<f64>(&format!("{}/capacity", bat))
        .or_else(|| ratio("energy_now", "energy_full"))
        .or_else(|| ratio("charge_now", "charge_full"))
    else {
        return Ok(None);
    };

    let power_plugged = if mains_online.is_empty() {
        read_trimmed(&format!("{}/status", bat)).and_then(|s| match s.as_str() {
            "Charging" | "Full" => Some(true),
            "Discharging" => Some(false),
            _ => None,
        })
    } else {
        Some(mains_online.iter().any(|on| *on))
    };

    Ok(Some(BatteryStatus {
        percent: crate::units::round_to(crate::units::clamp_percent(percent), 1),
        power_plugged,
    }))
}

const UTMP_RECORD_SIZE: usize = 384;
const UTMP_USER_PROCESS: i16 = 7;

/// Logged-in sessions from /var/run/utmp, or /run/utmp when the former is missing.
pub(super) fn read_utmp_sessions() -> std::io::Result<Vec<UserSession>> {
    #[cfg(target_os = "linux")]
    {
        let bytes = match std::fs::read("/var/run/utmp") {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => std::fs::read("/run/utmp")?,
            read => read?,
        };
        return Ok(parse_utmp(&bytes));
    }
    #[cfg(not(target_os = "linux"))]
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "login records not available on this platform",
    ))
}

/// Parse glibc `struct utmp` records (64-bit layout) and keep USER_PROCESS entries.
pub(super) fn parse_utmp(bytes: &[u8]) -> Vec<UserSession> {
    fn c_str(field: &[u8]) -> Option<String> {
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        let s = String::from_utf8_lossy(&field[..end]).trim().to_string();
        (!s.is_empty()).then_some(s)
    }

    bytes
        .chunks_exact(UTMP_RECORD_SIZE)
        .filter(|rec| i16::from_ne_bytes([rec[0], rec[1]]) == UTMP_USER_PROCESS)
        .filter_map(|rec| {
            Some(UserSession {
                name: c_str(&rec[44..76])?,
                terminal: c_str(&rec[8..40]),
                host: c_str(&rec[76..332]),
            })
        })
        .collect()
}
