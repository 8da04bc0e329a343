//! In-memory sensor registry.
//!
//! Sensors are kept in first-discovery order and are never removed; a sensor
//! that stops reporting keeps its last sample.

use std::collections::HashMap;

use crate::labels::LabelEntry;
use crate::record::LogRecord;
use crate::trend::TrendMarker;
use crate::types::{SensorId, Timestamp};

/// Latest display values of one sensor, all taken from the same record.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub sampled_at: Timestamp,
    /// Fahrenheit, one decimal.
    pub temperature_f: String,
    /// Percent, no decimals.
    pub humidity_pct: String,
    pub battery_pct: String,
}

impl SensorSample {
    pub fn from_record(record: &LogRecord) -> Self {
        Self {
            sampled_at: record.sampled_at,
            temperature_f: format!("{:.1}", record.temperature_f()),
            humidity_pct: format!("{:.0}", record.humidity_pct),
            battery_pct: format!("{}", record.battery_pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    pub sensor_id: SensorId,
    /// From the label map; `None` for sensors only seen on disk.
    pub label: Option<String>,
    pub sample: Option<SensorSample>,
    /// Marker from the most recent trend update.
    pub trend: Option<TrendMarker>,
}

impl SensorRecord {
    fn new(sensor_id: SensorId) -> Self {
        Self {
            sensor_id,
            label: None,
            sample: None,
            trend: None,
        }
    }

    /// Mapped label, falling back to the raw sensor id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.sensor_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    records: Vec<SensorRecord>,
    index: HashMap<SensorId, usize>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from a parsed label map. Later duplicates of an id
    /// replace the earlier label but keep its position.
    pub fn from_labels(entries: &[LabelEntry]) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.ensure(&entry.sensor_id).label = Some(entry.label.clone());
        }
        registry
    }

    /// Return the record for `sensor_id`, creating an empty one if unseen.
    pub fn ensure(&mut self, sensor_id: &str) -> &mut SensorRecord {
        let idx = match self.index.get(sensor_id) {
            Some(&idx) => idx,
            None => {
                let idx = self.records.len();
                self.records.push(SensorRecord::new(sensor_id.to_string()));
                self.index.insert(sensor_id.to_string(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    pub fn get(&self, sensor_id: &str) -> Option<&SensorRecord> {
        self.index.get(sensor_id).map(|&idx| &self.records[idx])
    }

    /// Replace the sensor's sample and trend marker together.
    pub fn record_sample(&mut self, sensor_id: &str, sample: SensorSample, trend: TrendMarker) {
        let record = self.ensure(sensor_id);
        record.sample = Some(sample);
        record.trend = Some(trend);
    }

    /// Records in first-discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
