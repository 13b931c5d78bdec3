//! Human-readable sizes, speeds and percentages.

/// Step between adjacent units.
pub const SCALE: f64 = 1024.0;

pub const BYTE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
pub const SPEED_UNITS: &[&str] = &["B/s", "KB/s", "MB/s", "GB/s"];

pub const DEFAULT_BYTE_PRECISION: usize = 2;
pub const DEFAULT_PERCENT_PRECISION: usize = 1;

/// Scale `value` down by [`SCALE`] until it fits the largest unit in `units`.
pub fn scale(value: f64, units: &[&'static str]) -> (f64, &'static str) {
    let mut v = if value.is_finite() { value.max(0.0) } else { 0.0 };
    let mut idx = 0;
    while v >= SCALE && idx + 1 < units.len() {
        v /= SCALE;
        idx += 1;
    }
    (v, units.get(idx).copied().unwrap_or(""))
}

pub fn format_bytes(bytes: u64, precision: usize) -> String {
    let (v, unit) = scale(bytes as f64, BYTE_UNITS);
    format!("{v:.precision$} {unit}")
}

pub fn format_speed(bytes_per_sec: f64, precision: usize) -> String {
    let (v, unit) = scale(bytes_per_sec, SPEED_UNITS);
    format!("{v:.precision$} {unit}")
}

pub fn format_percent(percent: f64, precision: usize) -> String {
    format!("{percent:.precision$}%")
}

/// Map any raw reading into [0, 100]; NaN reads as 0.
pub fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

/// `used / total` as a clamped percentage; 0 when `total` is 0.
pub fn usage_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_percent(used as f64 / total as f64 * 100.0)
}
