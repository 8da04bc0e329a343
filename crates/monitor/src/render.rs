//! Colored status table.
//!
//! Values at or beyond a limit are red; otherwise temperature and humidity
//! are green and battery is blue. A stale sample time is red.

use chrono::Local;
use crossterm::style::{Color, Stylize};

use sensorwatch_core::measurement::Measurement;
use sensorwatch_core::record::RECORD_TIME_FORMAT;
use sensorwatch_core::registry::{SensorRecord, SensorRegistry};
use sensorwatch_core::staleness::is_stale;
use sensorwatch_core::thresholds::ThresholdSpec;
use sensorwatch_core::types::{SensorId, Timestamp};

pub const TABLE_RULE: &str = "===================================================";
pub const TABLE_HEADER: &str = "Temp\tHumidity\tBattery\tLocation\tTime";

/// A rendered table plus what the caller needs to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub text: String,
    pub rows: usize,
    /// Sensors whose latest sample is stale, in table order.
    pub stale: Vec<SensorId>,
}

impl RenderedTable {
    pub fn any_stale(&self) -> bool {
        !self.stale.is_empty()
    }
}

fn default_color(measurement: Measurement) -> Color {
    match measurement {
        Measurement::Temp | Measurement::Humidity => Color::Green,
        Measurement::Battery => Color::Blue,
    }
}

fn value_color(
    thresholds: &ThresholdSpec,
    value: &str,
    measurement: Measurement,
    label: &str,
) -> Color {
    let alarmed = thresholds
        .is_alarmed_str(value, measurement, label)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, label, "Unparseable value, not evaluated");
            false
        });
    if alarmed {
        Color::Red
    } else {
        default_color(measurement)
    }
}

/// Render one row, or `None` for a sensor with no sample yet.
fn render_row(
    record: &SensorRecord,
    thresholds: &ThresholdSpec,
    now: Timestamp,
) -> Option<(String, bool)> {
    let sample = record.sample.as_ref()?;
    let label = record.display_label();

    let marker = match record.trend {
        Some(trend) if trend.active => trend.direction.glyph().to_string().red().to_string(),
        Some(trend) => trend.direction.glyph().to_string(),
        None => " ".to_string(),
    };

    let temp = format!("{}F", sample.temperature_f)
        .with(value_color(thresholds, &sample.temperature_f, Measurement::Temp, label));
    let humidity = format!("{}%", sample.humidity_pct)
        .with(value_color(thresholds, &sample.humidity_pct, Measurement::Humidity, label));
    let battery = format!("{}%", sample.battery_pct)
        .with(value_color(thresholds, &sample.battery_pct, Measurement::Battery, label));

    let stale = is_stale(sample.sampled_at, now);
    let time = sample
        .sampled_at
        .with_timezone(&Local)
        .format(RECORD_TIME_FORMAT)
        .to_string()
        .with(if stale { Color::Red } else { Color::Reset });

    Some((
        format!("{marker}{temp}\t{humidity}\t{battery}\t{label}\t{time}"),
        stale,
    ))
}

/// Render every sensor that has a sample, in registry order.
pub fn render_table(
    registry: &SensorRegistry,
    thresholds: &ThresholdSpec,
    now: Timestamp,
) -> RenderedTable {
    let mut text = format!("{TABLE_RULE}\n{TABLE_HEADER}\n");
    let mut rows = 0;
    let mut stale = Vec::new();

    for record in registry.iter() {
        if let Some((line, row_stale)) = render_row(record, thresholds, now) {
            text.push_str(&line);
            text.push('\n');
            rows += 1;
            if row_stale {
                stale.push(record.sensor_id.clone());
            }
        }
    }

    RenderedTable { text, rows, stale }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sensorwatch_core::labels::LabelEntry;
    use sensorwatch_core::record::LogRecord;
    use sensorwatch_core::registry::SensorSample;
    use sensorwatch_core::trend::{Direction, TrendMarker};

    fn registry_with(
        label: &str,
        celsius: f64,
        battery: f64,
        age: Duration,
        now: Timestamp,
    ) -> SensorRegistry {
        let mut registry = SensorRegistry::from_labels(&[LabelEntry {
            sensor_id: "AABBCCDDEEFF".into(),
            label: label.into(),
        }]);
        let record = LogRecord {
            sampled_at: now - age,
            celsius,
            humidity_pct: 45.0,
            battery_pct: battery,
        };
        registry.record_sample(
            "AABBCCDDEEFF",
            SensorSample::from_record(&record),
            TrendMarker {
                direction: Direction::Steady,
                active: false,
            },
        );
        registry
    }

    #[test]
    fn renders_row_with_units() {
        let now = Utc::now();
        let registry = registry_with("Garden", 19.0, 80.0, Duration::minutes(1), now);
        let table = render_table(&registry, &ThresholdSpec::builtin(), now);
        assert_eq!(table.rows, 1);
        assert!(table.text.contains("66.2F"));
        assert!(table.text.contains("45%"));
        assert!(table.text.contains("80%"));
        assert!(table.text.contains("Garden"));
        assert!(!table.any_stale());
    }

    #[test]
    fn sensors_without_samples_are_not_rendered() {
        let registry = SensorRegistry::from_labels(&[LabelEntry {
            sensor_id: "AABBCCDDEEFF".into(),
            label: "Porch".into(),
        }]);
        let table = render_table(&registry, &ThresholdSpec::builtin(), Utc::now());
        assert_eq!(table.rows, 0);
        assert!(table.text.starts_with(TABLE_RULE));
    }

    #[test]
    fn stale_sensors_are_reported() {
        let now = Utc::now();
        let registry = registry_with("Garden", 19.0, 80.0, Duration::minutes(11), now);
        let table = render_table(&registry, &ThresholdSpec::builtin(), now);
        assert_eq!(table.stale, vec!["AABBCCDDEEFF".to_string()]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let now = Utc::now();
        let registry = registry_with("Garden", 3.0, 20.0, Duration::minutes(2), now);
        let thresholds = ThresholdSpec::builtin();
        assert_eq!(
            render_table(&registry, &thresholds, now),
            render_table(&registry, &thresholds, now)
        );
    }

    #[test]
    fn alarm_color_differs_from_default() {
        assert_eq!(
            value_color(&ThresholdSpec::builtin(), "24.9", Measurement::Battery, "garage"),
            Color::Red
        );
        assert_eq!(
            value_color(&ThresholdSpec::builtin(), "80", Measurement::Battery, "garage"),
            Color::Blue
        );
        assert_eq!(
            value_color(&ThresholdSpec::builtin(), "50", Measurement::Temp, "garden"),
            Color::Green
        );
    }
}
