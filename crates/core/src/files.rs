//! Log file discovery.
//!
//! The logger keeps one file per sensor per month, named
//! `<prefix>-<sensorId>-<YYYY>-<MM>.<ext>` (e.g. `gvh-A4C138E72A5F-2023-10.txt`).
//! Only the newest month for each sensor is tracked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::types::{normalize_sensor_id, SensorId};

/// Extension of the per-sensor log files.
pub const LOG_FILE_EXTENSION: &str = "txt";

/// The parts of a log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileName {
    pub prefix: String,
    pub sensor_id: SensorId,
    /// First day of the month the file covers.
    pub period: NaiveDate,
}

/// The current log file for one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorLogFile {
    pub sensor_id: SensorId,
    pub period: NaiveDate,
    pub path: PathBuf,
}

/// Parse `<prefix>-<sensorId>-<YYYY>-<MM>.<ext>`.
///
/// The prefix may itself contain dashes; fields are taken from the right.
pub fn parse_log_file_name(name: &str) -> Result<LogFileName, CoreError> {
    let err = |reason: &str| CoreError::FileName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => name,
    };

    let mut parts = stem.rsplitn(4, '-');
    let month = parts.next().ok_or_else(|| err("missing month"))?;
    let year = parts.next().ok_or_else(|| err("missing year"))?;
    let raw_id = parts.next().ok_or_else(|| err("missing sensor id"))?;
    let prefix = parts.next().ok_or_else(|| err("missing prefix"))?;

    let sensor_id =
        normalize_sensor_id(raw_id).ok_or_else(|| err("sensor id is not 12 hex digits"))?;

    let year: i32 = year.parse().map_err(|_| err("year is not numeric"))?;
    let month: u32 = month.parse().map_err(|_| err("month is not numeric"))?;
    let period = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| err("invalid year-month"))?;

    Ok(LogFileName {
        prefix: prefix.to_string(),
        sensor_id,
        period,
    })
}

/// Keep only the newest file per sensor from `paths`.
///
/// Names that do not parse are logged and skipped. The result is sorted by
/// sensor id so that two resolutions of the same directory compare equal.
pub fn latest_per_sensor<I>(paths: I) -> Vec<SensorLogFile>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut latest: HashMap<SensorId, SensorLogFile> = HashMap::new();

    for path in paths {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!(path = %path.display(), "Skipping file with non-UTF-8 name");
                continue;
            }
        };

        let parsed = match parse_log_file_name(&name) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping file");
                continue;
            }
        };

        let newer = latest
            .get(&parsed.sensor_id)
            .map_or(true, |current| parsed.period > current.period);
        if newer {
            tracing::debug!(
                prefix = %parsed.prefix,
                sensor_id = %parsed.sensor_id,
                period = %parsed.period,
                "Newest log file so far",
            );
            latest.insert(
                parsed.sensor_id.clone(),
                SensorLogFile {
                    sensor_id: parsed.sensor_id,
                    period: parsed.period,
                    path,
                },
            );
        }
    }

    let mut files: Vec<SensorLogFile> = latest.into_values().collect();
    files.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
    files
}

/// Scan `dir` for `*.txt` log files and return the newest one per sensor.
pub fn resolve_latest_files(dir: &Path) -> Result<Vec<SensorLogFile>, CoreError> {
    let io_err = |source| CoreError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_log = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == LOG_FILE_EXTENSION);
        if is_log {
            candidates.push(path);
        }
    }

    Ok(latest_per_sensor(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_name() {
        let parsed = parse_log_file_name("gvh-A4C1383BB160-2023-09.txt").unwrap();
        assert_eq!(parsed.prefix, "gvh");
        assert_eq!(parsed.sensor_id, "A4C1383BB160");
        assert_eq!(parsed.period, NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
    }

    #[test]
    fn prefix_may_contain_dashes() {
        let parsed = parse_log_file_name("my-logger-A4C1383BB160-2024-01.txt").unwrap();
        assert_eq!(parsed.prefix, "my-logger");
        assert_eq!(parsed.sensor_id, "A4C1383BB160");
    }

    #[test]
    fn rejects_unexpected_names() {
        assert!(parse_log_file_name("stuff").is_err());
        assert!(parse_log_file_name("gvh-A4C1383BB160-2023.txt").is_err());
        assert!(parse_log_file_name("gvh-A4C1383BB160-2023-13.txt").is_err());
        assert!(parse_log_file_name("gvh-SHORT-2023-09.txt").is_err());
        assert!(parse_log_file_name("gvh-A4C1383BB160-20x3-09.txt").is_err());
    }

    #[test]
    fn newest_month_wins_per_sensor() {
        let files = latest_per_sensor(vec![
            PathBuf::from("path/stuff"),
            PathBuf::from("/path/gvh-A4C1383BB160-2023-09.txt"),
            PathBuf::from("/path/gvh-A4C1383BB160-2023-08.txt"),
            PathBuf::from("/path/gvh-B4D1383BB161-2023-07.txt"),
            PathBuf::from("/path/gvh-B4D1383BB161-2023-10.txt"),
        ]);

        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/path/gvh-A4C1383BB160-2023-09.txt"),
                PathBuf::from("/path/gvh-B4D1383BB161-2023-10.txt"),
            ]
        );
    }

    #[test]
    fn year_rollover_orders_correctly() {
        let files = latest_per_sensor(vec![
            PathBuf::from("gvh-AABBCCDDEEFF-2024-01.txt"),
            PathBuf::from("gvh-AABBCCDDEEFF-2023-12.txt"),
        ]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].period, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
