// Human readable sizes and durations for captions and status lines

use humansize::{format_size, BINARY};

/// Format a byte count with binary units (e.g. "1.5 GiB")
pub fn readable_file_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

const PERIODS: &[(&str, &str, u64)] = &[
    ("day", "d", 86_400),
    ("hour", "h", 3_600),
    ("minute", "m", 60),
    ("second", "s", 1),
];

/// Format a number of seconds.
///
/// The compact form reads `1h2m3s`, the full form `1 hour 2 minutes 3 seconds`.
/// Fractions of a second are dropped; zero renders as `0s` / `0 seconds`.
pub fn readable_time(seconds: f64, full: bool) -> String {
    let mut remaining = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };

    if remaining == 0 {
        return if full { "0 seconds".to_string() } else { "0s".to_string() };
    }

    let mut parts = Vec::new();
    for (name, short, period) in PERIODS {
        if remaining >= *period {
            let value = remaining / period;
            remaining %= period;
            if full {
                let plural = if value == 1 { "" } else { "s" };
                parts.push(format!("{} {}{}", value, name, plural));
            } else {
                parts.push(format!("{}{}", value, short));
            }
        }
    }

    if full {
        parts.join(" ")
    } else {
        parts.concat()
    }
}
