//! Where sensor labels and records come from.
//!
//! [`FsSource`] reads the logger's directory and label map; [`FixtureSource`]
//! serves canned data for running without hardware and for tests. The
//! sampling loop only sees the [`DataSource`] trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sensorwatch_core::error::CoreError;
use sensorwatch_core::files::resolve_latest_files;
use sensorwatch_core::labels::{parse_label_map, LabelEntry};
use sensorwatch_core::tail::read_last_record;
use sensorwatch_core::types::{normalize_sensor_id, SensorId};

/// The current data file for one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFile {
    pub sensor_id: SensorId,
    pub path: PathBuf,
}

pub trait DataSource {
    /// Label map entries, in file order. Empty when unavailable.
    fn label_entries(&self) -> Vec<LabelEntry>;

    /// One current file per sensor, in a stable order.
    fn list_sensor_files(&self) -> Vec<SensorFile>;

    /// The newest complete record for `file`, if any.
    fn read_latest_record(&self, file: &SensorFile) -> Option<String>;
}

/// Filesystem-backed source.
#[derive(Debug, Clone)]
pub struct FsSource {
    log_dir: PathBuf,
    label_map: PathBuf,
}

impl FsSource {
    pub fn new(log_dir: PathBuf, label_map: PathBuf) -> Self {
        Self { log_dir, label_map }
    }
}

impl DataSource for FsSource {
    fn label_entries(&self) -> Vec<LabelEntry> {
        match std::fs::read_to_string(&self.label_map) {
            Ok(text) => parse_label_map(&text),
            Err(e) => {
                tracing::warn!(
                    path = %self.label_map.display(),
                    error = %e,
                    "Label map unreadable, sensors will be shown by id",
                );
                Vec::new()
            }
        }
    }

    fn list_sensor_files(&self) -> Vec<SensorFile> {
        match resolve_latest_files(&self.log_dir) {
            Ok(files) => files
                .into_iter()
                .map(|f| SensorFile {
                    sensor_id: f.sensor_id,
                    path: f.path,
                })
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to scan log directory");
                Vec::new()
            }
        }
    }

    fn read_latest_record(&self, file: &SensorFile) -> Option<String> {
        read_last_record(&file.path)
    }
}

/// On-disk fixture format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Label map lines, same format as the label map file.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Sensor id -> latest record line.
    #[serde(default)]
    pub records: BTreeMap<String, String>,
}

/// In-memory source serving a [`Fixture`].
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    labels: Vec<String>,
    records: BTreeMap<SensorId, String>,
}

impl FixtureSource {
    pub fn new(fixture: Fixture) -> Result<Self, CoreError> {
        let mut records = BTreeMap::new();
        for (raw_id, line) in fixture.records {
            let id = normalize_sensor_id(&raw_id).ok_or_else(|| {
                CoreError::Validation(format!("fixture sensor id '{raw_id}' is not 12 hex digits"))
            })?;
            records.insert(id, line);
        }
        Ok(Self {
            labels: fixture.labels,
            records,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(serde_json::from_str(&text)?)
    }

    /// Replace (or add) the record served for `sensor_id`.
    pub fn set_record(&mut self, sensor_id: &str, line: &str) {
        self.records.insert(sensor_id.to_string(), line.to_string());
    }
}

impl DataSource for FixtureSource {
    fn label_entries(&self) -> Vec<LabelEntry> {
        parse_label_map(&self.labels.join("\n"))
    }

    fn list_sensor_files(&self) -> Vec<SensorFile> {
        self.records
            .keys()
            .map(|id| SensorFile {
                sensor_id: id.clone(),
                path: PathBuf::from(id),
            })
            .collect()
    }

    fn read_latest_record(&self, file: &SensorFile) -> Option<String> {
        self.records.get(&file.sensor_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fixture() -> Fixture {
        serde_json::from_str(
            r#"{
                "labels": [
                    "A4:C1:38:E7:2A:5F\tGarden (A4:C1:38:E7:2A:5F)",
                    "A4:C1:38:7C:05:A8\tCrawl (A4:C1:38:7C:05:A8)"
                ],
                "records": {
                    "A4C138E72A5F": "2023-09-10 09:09:50\t-5\t56.4\t100",
                    "a4c1387c05a8": "2023-09-10 09:09:51\t19\t80\t15"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn fixture_serves_labels_and_records() {
        let source = FixtureSource::new(sample_fixture()).unwrap();

        let labels: Vec<_> = source.label_entries().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Garden", "Crawl"]);

        let files = source.list_sensor_files();
        let ids: Vec<_> = files.iter().map(|f| f.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["A4C1387C05A8", "A4C138E72A5F"]);

        assert_eq!(
            source.read_latest_record(&files[0]).as_deref(),
            Some("2023-09-10 09:09:51\t19\t80\t15")
        );
    }

    #[test]
    fn fixture_rejects_bad_ids() {
        let fixture = Fixture {
            labels: Vec::new(),
            records: BTreeMap::from([("short".to_string(), "x".to_string())]),
        };
        assert!(FixtureSource::new(fixture).is_err());
    }

    #[test]
    fn missing_label_map_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path().to_path_buf(), dir.path().join("missing.txt"));
        assert!(source.label_entries().is_empty());
        assert!(source.list_sensor_files().is_empty());
    }
}
