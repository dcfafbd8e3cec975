const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Human readable byte count in powers of 1024, e.g. `6.00 MB`.
pub fn pretty_size_from_bytes(bytes: u64) -> String {
    if bytes < STEP as u64 {
        return format!("{} {}", bytes, UNITS[0]);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
