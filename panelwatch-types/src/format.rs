//! Human-readable value formatting.
//!
//! Metric values arrive from the backend as strings inside the query payload.
//! Formatting never fails: anything that does not parse as a finite number
//! renders as `"N/A"`.

/// Binary byte scale, largest first index last.
const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a raw string value with an optional unit hint.
///
/// Coerces the string to a number first; `"N/A"` on any parse failure.
pub fn format_raw(raw: &str, unit: Option<&str>) -> String {
    match raw.trim().parse::<f64>() {
        Ok(value) => format_value(value, unit),
        Err(_) => "N/A".to_string(),
    }
}

/// Format a numeric value with an optional unit hint.
///
/// Recognized units: `percent`, `bytes`, `decmbytes`, `short`, `ms`,
/// `reqps`. Unknown or absent units render as a plain two-decimal number.
/// Non-finite values render as `"N/A"`.
pub fn format_value(value: f64, unit: Option<&str>) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }

    match unit.unwrap_or("") {
        "percent" => format!("{value:.1}%"),
        "bytes" => format_bytes(value),
        "decmbytes" => format!("{value:.1} MB"),
        "short" => format_short(value),
        "ms" => format!("{value:.2}ms"),
        "reqps" => format!("{value:.2}/s"),
        _ => format!("{value:.2}"),
    }
}

/// Binary-scaled byte string, one decimal, choosing the largest scale
/// where `bytes / 1024^i >= 1`.
fn format_bytes(bytes: f64) -> String {
    if bytes == 0.0 {
        return "0 B".to_string();
    }

    let mut scaled = bytes;
    let mut index = 0;
    while index < BYTE_UNITS.len() - 1 && scaled / 1024.0 >= 1.0 {
        scaled /= 1024.0;
        index += 1;
    }

    format!("{scaled:.1} {}", BYTE_UNITS[index])
}

/// Abbreviated large-number format: millions, thousands, or plain integer.
fn format_short(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}
