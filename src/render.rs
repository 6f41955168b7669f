//! Human readable rendering of values.

/// Renders a number of seconds like `1 day 2 hours` or `4 minutes 5 seconds`.
///
/// ```rust
/// # use mk_plugins::render::timespan;
/// assert_eq!(timespan(93784.0), "1 day 2 hours");
/// assert_eq!(timespan(42.0), "42 seconds");
/// ```
pub fn timespan(seconds: f64) -> String {
    if seconds < 0.0 {
        return format!("-{}", timespan(-seconds));
    }

    let total = seconds.round() as u64;
    let (days, rest) = (total / 86400, total % 86400);
    let (hours, rest) = (rest / 3600, rest % 3600);
    let (minutes, secs) = (rest / 60, rest % 60);

    let chunks = if days > 0 {
        [(days, "day"), (hours, "hour")]
    } else if hours > 0 {
        [(hours, "hour"), (minutes, "minute")]
    } else if minutes > 0 {
        [(minutes, "minute"), (secs, "second")]
    } else {
        return plural(secs, "second");
    };

    chunks
        .iter()
        .map(|(n, unit)| plural(*n, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Renders a byte count with binary prefixes.
///
/// ```rust
/// # use mk_plugins::render::bytes;
/// assert_eq!(bytes(512.0), "512 B");
/// assert_eq!(bytes(1536.0 * 1024.0 * 1024.0), "1.50 GiB");
/// ```
pub fn bytes(value: f64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if value.abs() < 1024.0 {
        return format!("{} B", value);
    }

    let mut scaled = value;
    let mut unit = UNITS[0];
    for u in UNITS {
        scaled /= 1024.0;
        unit = u;
        if scaled.abs() < 1024.0 {
            break;
        }
    }
    format!("{:.2} {}", scaled, unit)
}

pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timespan() {
        assert_eq!(timespan(0.0), "0 seconds");
        assert_eq!(timespan(1.0), "1 second");
        assert_eq!(timespan(61.0), "1 minute 1 second");
        assert_eq!(timespan(3600.0), "1 hour 0 minutes");
        assert_eq!(timespan(86400.0), "1 day 0 hours");
        assert_eq!(timespan(604800.0), "7 days 0 hours");
        assert_eq!(timespan(-90.0), "-1 minute 30 seconds");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(bytes(0.0), "0 B");
        assert_eq!(bytes(1024.0), "1.00 KiB");
        assert_eq!(bytes(10.0 * 1024.0 * 1024.0 * 1024.0), "10.00 GiB");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(45.0), "45.00%");
        assert_eq!(percent(99.999), "100.00%");
    }
}
