//! Fixed-width text for panel and menu values.
//!
//! Panel text must not change width between ticks or the whole bar jitters,
//! so percentages are capped at 99.9 and rates at 999.9 of their unit.

use panelmon_core::{MetricKind, Reading, SensorError};

pub const NOT_AVAILABLE: &str = "N/A";

pub const DISABLED: &str = "off";

const PERCENT_CAP: f64 = 99.9;

/// `" 42.0%"`: six columns, capped at 99.9
pub fn format_percent(value: f64) -> String {
    let value = value.clamp(0.0, PERCENT_CAP);
    format!("{:5.1}%", value)
}

/// Human readable rate for the dropdown, e.g. `1.5 MB/s`
pub fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

    let mut value = bytes_per_sec.max(0.0);
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} TB/s", value)
}

/// Rate in exactly eight columns for the panel, e.g. `"    1.5M"`
pub fn format_rate_fixed(bytes_per_sec: f64) -> String {
    const UNITS: [char; 5] = ['B', 'K', 'M', 'G', 'T'];

    let mut value = bytes_per_sec.max(0.0);
    let mut unit = UNITS[0];
    for (i, u) in UNITS.iter().enumerate() {
        unit = *u;
        if value < 1024.0 || i == UNITS.len() - 1 {
            break;
        }
        value /= 1024.0;
    }

    format!("{:>7.1}{}", value.min(999.9), unit)
}

/// Menu text for one reading; a switched-off metric reads `off`
pub fn format_reading(reading: Option<&Reading>) -> String {
    match reading {
        Some(reading) if reading.error == Some(SensorError::Disabled) => DISABLED.to_string(),
        Some(reading) => match reading.value() {
            Some(value) if reading.kind.is_rate() => format_rate(value),
            Some(value) => format_percent(value),
            None => NOT_AVAILABLE.to_string(),
        },
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Panel text for one reading, padded to the width a value would take
pub fn format_panel_value(kind: MetricKind, reading: Option<&Reading>) -> String {
    match reading.and_then(Reading::value) {
        Some(value) if kind.is_rate() => format_rate_fixed(value),
        Some(value) => format_percent(value),
        None if kind.is_rate() => format!("{:>8}", NOT_AVAILABLE),
        None => format!("{:>6}", NOT_AVAILABLE),
    }
}
