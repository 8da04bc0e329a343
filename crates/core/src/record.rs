//! Parsing of a single logger record.
//!
//! Format (tab separated): `YYYY-MM-DD HH:MM:SS \t celsius \t humidity% \t battery%`.
//! The timestamp is UTC without an offset marker.

use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// `strftime` format of record timestamps (also used for display).
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub sampled_at: Timestamp,
    pub celsius: f64,
    pub humidity_pct: f64,
    pub battery_pct: f64,
}

impl LogRecord {
    pub fn temperature_f(&self) -> f64 {
        celsius_to_fahrenheit(self.celsius)
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Decode a record. Every field must be present and well formed.
pub fn parse_record(line: &str) -> Result<LogRecord, CoreError> {
    let fields: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(CoreError::Record {
            reason: format!("expected 4 tab-separated fields, found {}", fields.len()),
        });
    }

    let naive = NaiveDateTime::parse_from_str(fields[0], RECORD_TIME_FORMAT).map_err(|e| {
        CoreError::Record {
            reason: format!("bad timestamp '{}': {e}", fields[0]),
        }
    })?;

    Ok(LogRecord {
        sampled_at: Utc.from_utc_datetime(&naive),
        celsius: parse_number(fields[1], "celsius")?,
        humidity_pct: parse_number(fields[2], "humidity")?,
        battery_pct: parse_number(fields[3], "battery")?,
    })
}

fn parse_number(raw: &str, field: &str) -> Result<f64, CoreError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CoreError::Record {
            reason: format!("{field} '{raw}' is not a number"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_well_formed_record() {
        let rec = parse_record("2023-09-10 09:09:50\t-5\t56.4\t100").unwrap();
        assert_eq!(rec.sampled_at.year(), 2023);
        assert_eq!(rec.sampled_at.hour(), 9);
        assert_eq!(rec.sampled_at.second(), 50);
        assert_eq!(rec.celsius, -5.0);
        assert_eq!(rec.humidity_pct, 56.4);
        assert_eq!(rec.battery_pct, 100.0);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(format!("{:.1}", celsius_to_fahrenheit(-5.0)), "23.0");
        assert_eq!(format!("{:.1}", celsius_to_fahrenheit(19.0)), "66.2");
        assert_eq!(format!("{:.1}", celsius_to_fahrenheit(100.0)), "212.0");
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert_matches!(
            parse_record("2023-09-10T09:09:50\t-5\t56.4\t100"),
            Err(CoreError::Record { .. })
        );
    }

    #[test]
    fn rejects_non_numeric_field() {
        assert_matches!(
            parse_record("2023-09-10 09:09:50\tabc\t56.4\t100"),
            Err(CoreError::Record { .. })
        );
        assert_matches!(
            parse_record("2023-09-10 09:09:50\t-5\t56.4\tNaN"),
            Err(CoreError::Record { .. })
        );
    }

    #[test]
    fn rejects_short_record() {
        assert_matches!(
            parse_record("2023-09-10 09:09:50\t-5"),
            Err(CoreError::Record { .. })
        );
    }
}
