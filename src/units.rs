// Unit conversion helpers: bytes -> GB, bytes -> human units, seconds -> h/m/s

use serde::{Deserialize, Serialize};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const HUMAN_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Bytes to gigabytes (1 GB = 1024^3 bytes), rounded to 2 decimals.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_GB, 2)
}

/// Human-readable size with two decimals, e.g. `"1.50 KB"`. Values past TB stay in TB.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = HUMAN_UNITS[0];
    for (i, u) in HUMAN_UNITS.iter().enumerate() {
        unit = u;
        if value < 1024.0 || i == HUMAN_UNITS.len() - 1 {
            break;
        }
        value /= 1024.0;
    }
    format!("{:.2} {}", value, unit)
}

/// Seconds to `"{h}h {m}m {s}s"`, truncating fractions. Negative input formats as zero.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// `part / whole` as 0-100 with one decimal; `None` when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(clamp_percent(round_to(
        (part as f64 / whole as f64) * 100.0,
        1,
    )))
}

/// Clamps a percentage into 0-100; NaN becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Total/used/free in gigabytes, with the raw byte counts kept for computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl Capacity {
    /// Values are taken verbatim; used + free is not reconciled against total.
    pub fn from_bytes(total: u64, used: u64, free: u64) -> Self {
        Self {
            total_gb: bytes_to_gb(total),
            used_gb: bytes_to_gb(used),
            free_gb: bytes_to_gb(free),
            total_bytes: total,
            used_bytes: used,
            free_bytes: free,
        }
    }

    pub fn zero() -> Self {
        Self::from_bytes(0, 0, 0)
    }

    /// Sum of byte counts, converted once (avoids accumulating rounding error).
    pub fn sum<'a, I: IntoIterator<Item = &'a Capacity>>(items: I) -> Self {
        let (total, used, free) = items.into_iter().fold((0u64, 0u64, 0u64), |acc, c| {
            (
                acc.0.saturating_add(c.total_bytes),
                acc.1.saturating_add(c.used_bytes),
                acc.2.saturating_add(c.free_bytes),
            )
        });
        Self::from_bytes(total, used, free)
    }

    pub fn usage_percent(&self) -> Option<f64> {
        percent(self.used_bytes, self.total_bytes)
    }
}
