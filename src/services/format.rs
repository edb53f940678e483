//! Human-readable sizes and durations for summary text.

/// Binary unit ladder used by [`format_bytes`].
const UNITS: [&str; 7] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Decimal places kept before trailing zeros are trimmed.
const DECIMALS: usize = 2;

/// Format an exact byte count using 1024-based units.
///
/// Zero is special-cased to `"0 Bytes"`. Otherwise the largest unit whose
/// scaled value is at least 1 is chosen and the value is rounded to two
/// decimal places, e.g. `1536` becomes `"1.5 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", trim_decimals(value), UNITS[unit])
}

fn trim_decimals(value: f64) -> String {
    let fixed = format!("{:.*}", DECIMALS, value);
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Format an elapsed duration reported by the backend.
///
/// `"850 ms"`, `"12.034 s"`, `"3 min 5.200 s"`.
pub fn format_elapsed(millis: u64) -> String {
    if millis < 1000 {
        return format!("{} ms", millis);
    }

    let seconds = millis / 1000;
    let remainder = millis % 1000;
    if seconds < 60 {
        return format!("{}.{:03} s", seconds, remainder);
    }

    format!("{} min {}.{:03} s", seconds / 60, seconds % 60, remainder)
}
