// NVIDIA GPUs via `nvidia-smi` CSV output

use crate::error::{ProbeError, ProbeResult};
use crate::models::GpuDevice;

const QUERY: &str = "--query-gpu=index,name,utilization.gpu,memory.used,memory.total,temperature.gpu";

/// Runs nvidia-smi. Unavailable when the binary is missing or the driver isn't loaded.
pub(super) fn query_nvidia_smi() -> ProbeResult<Vec<GpuDevice>> {
    let output = std::process::Command::new("nvidia-smi")
        .args([QUERY, "--format=csv,noheader,nounits"])
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProbeError::unavailable("nvidia-smi not installed"),
            _ => ProbeError::transient(format!("nvidia-smi: {}", e)),
        })?;
    if !output.status.success() {
        // nvidia-smi exits non-zero when no driver/device is present
        return Err(ProbeError::unavailable(format!(
            "nvidia-smi exited with {}",
            output.status
        )));
    }
    Ok(parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout)))
}

/// One device per CSV line. Fields nvidia-smi can't read come back as "[N/A]"
/// or "[Not Supported]" and map to null.
pub fn parse_nvidia_smi(csv: &str) -> Vec<GpuDevice> {
    fn num(field: Option<&str>) -> Option<f64> {
        field?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    csv.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.split(',');
            let index = fields.next()?.trim().parse::<u32>().ok()?;
            let name = fields
                .next()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty() && !n.starts_with('['));
            Some(GpuDevice {
                index,
                name,
                load_percent: num(fields.next()).map(crate::units::clamp_percent),
                memory_used_mb: num(fields.next()),
                memory_total_mb: num(fields.next()),
                temperature_celsius: num(fields.next()),
            })
        })
        .collect()
}
