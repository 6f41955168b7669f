//! Conversion of raw encoded agent values into physical units.

use crate::error::{Error, Result};

/// Raw optical power reading a transceiver reports when there is no signal at all.
pub const NO_SIGNAL: &str = "-99999999";

/// Parses a raw integer reading and scales it by `divisor`.
pub fn parse_value(raw: &str, divisor: f64) -> Result<f64> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .map(|v| v / divisor)
        .map_err(|_| Error::format(format!("expected a number, got {raw:?}")))
}

/// Parses a raw alarm level. An empty string or a literal `0` means no level is configured.
pub fn parse_alarm_level(raw: &str, divisor: f64) -> Result<Option<f64>> {
    match raw.trim() {
        "" | "0" => Ok(None),
        raw => parse_value(raw, divisor).map(Some),
    }
}

/// Converts dBm to microwatts.
pub fn dbm_to_uw(dbm: f64) -> f64 {
    10f64.powf((dbm - 30.0) / 10.0) * 1_000_000.0
}

/// Converts microwatts to dBm. Zero microwatts is negative infinity.
pub fn uw_to_dbm(uw: f64) -> f64 {
    if uw == 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * (uw / 1_000_000.0).log10() + 30.0
}

/// Parses an optical power reading in tenths of dBm into microwatts.
pub fn parse_power(raw: &str) -> Result<f64> {
    if raw.trim() == NO_SIGNAL {
        return Ok(0.0);
    }
    parse_value(raw, 10.0).map(dbm_to_uw)
}

/// Parses an optical power alarm level in tenths of dBm into microwatts.
pub fn parse_power_level(raw: &str) -> Result<Option<f64>> {
    Ok(parse_alarm_level(raw, 10.0)?.map(dbm_to_uw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{a} != {b}");
    }

    #[test]
    fn test_parse_value() {
        assert_close(parse_value("2500", 1000.0).unwrap(), 2.5);
        assert_close(parse_value("33000", 10000.0).unwrap(), 3.3);
        assert_close(parse_value("-45", 10.0).unwrap(), -4.5);
        assert!(matches!(parse_value("abc", 1000.0), Err(Error::Format(_))));
        assert!(parse_value("", 1000.0).is_err());
    }

    #[test]
    fn test_parse_alarm_level() {
        assert_eq!(parse_alarm_level("", 1000.0).unwrap(), None);
        assert_eq!(parse_alarm_level("0", 1000.0).unwrap(), None);
        assert_eq!(parse_alarm_level("0", 10.0).unwrap(), None);
        assert_eq!(parse_alarm_level("75000", 1000.0).unwrap(), Some(75.0));
        assert!(parse_alarm_level("x", 1000.0).is_err());
    }

    #[test]
    fn test_dbm_uw() {
        assert_close(dbm_to_uw(0.0), 1000.0);
        assert_close(dbm_to_uw(-30.0), 1.0);
        assert_close(uw_to_dbm(1000.0), 0.0);
        assert_eq!(uw_to_dbm(0.0), f64::NEG_INFINITY);

        for dbm in [-40.0, -12.3, -2.5, 0.0, 3.1, 8.0] {
            assert_close(uw_to_dbm(dbm_to_uw(dbm)), dbm);
        }
        for uw in [0.5, 12.0, 501.2, 1000.0, 2000.0] {
            assert_close(dbm_to_uw(uw_to_dbm(uw)), uw);
        }
    }

    #[test]
    fn test_parse_power() {
        assert_close(parse_power("-25").unwrap(), dbm_to_uw(-2.5));
        assert_eq!(parse_power(NO_SIGNAL).unwrap(), 0.0);
        // no signal is terminal, it does not come back as a dBm value
        assert_eq!(uw_to_dbm(parse_power(NO_SIGNAL).unwrap()), f64::NEG_INFINITY);

        assert_eq!(parse_power_level("0").unwrap(), None);
        assert_close(parse_power_level("-100").unwrap().unwrap(), dbm_to_uw(-10.0));
    }
}
