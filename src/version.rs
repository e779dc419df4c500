// Build-time identity from Cargo.toml

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// One-line banner served at `/` and logged at startup, e.g. "hostscope 0.1.0: host telemetry".
pub fn banner() -> String {
    format!("{} {}: host telemetry", NAME, VERSION)
}
