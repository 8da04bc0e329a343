//! Threshold evaluation engine for sensor readings.
//!
//! Pure logic. Limits are keyed by lowercased sensor label, then by
//! [`Measurement`]. The reserved label [`ALL_SENSORS`] applies to every
//! sensor in addition to its own limits.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::measurement::Measurement;

/// Label whose limits apply to every sensor.
pub const ALL_SENSORS: &str = "all";

/// Default low-battery alarm level, percent.
pub const BATTERY_LOW_PCT: f64 = 25.0;

/// Inclusive alarm bounds for one measurement. Absent bounds never fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi: Option<f64>,
}

impl Bounds {
    pub fn low(low: f64) -> Self {
        Self {
            low: Some(low),
            hi: None,
        }
    }

    pub fn hi(hi: f64) -> Self {
        Self {
            low: None,
            hi: Some(hi),
        }
    }

    pub fn range(low: f64, hi: f64) -> Self {
        Self {
            low: Some(low),
            hi: Some(hi),
        }
    }

    /// `value >= hi` or `value <= low`.
    pub fn is_at_limit(&self, value: f64) -> bool {
        let above = self.hi.is_some_and(|hi| value >= hi);
        let below = self.low.is_some_and(|low| value <= low);
        above || below
    }

    fn validate(&self, context: &str) -> Result<(), CoreError> {
        for (name, bound) in [("low", self.low), ("hi", self.hi)] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "{context}.{name} must be a finite number, got {v}"
                    )));
                }
            }
        }
        if let (Some(low), Some(hi)) = (self.low, self.hi) {
            if low >= hi {
                return Err(CoreError::Validation(format!(
                    "{context}: low ({low}) must be below hi ({hi})"
                )));
            }
        }
        Ok(())
    }
}

/// Per-measurement limits for one sensor label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<Bounds>,
}

impl SensorLimits {
    pub fn get(&self, measurement: Measurement) -> Option<&Bounds> {
        match measurement {
            Measurement::Temp => self.temp.as_ref(),
            Measurement::Humidity => self.humidity.as_ref(),
            Measurement::Battery => self.battery.as_ref(),
        }
    }

    fn slot(&mut self, measurement: Measurement) -> &mut Option<Bounds> {
        match measurement {
            Measurement::Temp => &mut self.temp,
            Measurement::Humidity => &mut self.humidity,
            Measurement::Battery => &mut self.battery,
        }
    }
}

/// All configured alarm limits, validated at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSpec {
    sensors: HashMap<String, SensorLimits>,
}

impl ThresholdSpec {
    /// An empty spec: nothing is ever alarmed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bounds for `label` / `measurement`, replacing any previous
    /// bounds for that pair.
    pub fn with_limit(mut self, label: &str, measurement: Measurement, bounds: Bounds) -> Self {
        *self
            .sensors
            .entry(label.trim().to_lowercase())
            .or_default()
            .slot(measurement) = Some(bounds);
        self
    }

    /// Limits of the original deployment.
    pub fn builtin() -> Self {
        let garden_low = 41.0;
        Self::new()
            .with_limit(ALL_SENSORS, Measurement::Battery, Bounds::low(BATTERY_LOW_PCT))
            .with_limit("crawl", Measurement::Humidity, Bounds::hi(55.0))
            .with_limit("garage", Measurement::Temp, Bounds::low(40.0))
            .with_limit("garden", Measurement::Temp, Bounds::low(garden_low))
            .with_limit("porch", Measurement::Temp, Bounds::low(garden_low + 5.0))
            .with_limit("living", Measurement::Temp, Bounds::range(55.0, 85.0))
            .with_limit("living", Measurement::Humidity, Bounds::hi(60.0))
    }

    /// Parse and validate a JSON threshold document.
    ///
    /// Labels are lowercased; two labels differing only in case are rejected.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let raw: HashMap<String, SensorLimits> = serde_json::from_str(text)?;

        let mut sensors = HashMap::with_capacity(raw.len());
        for (label, limits) in raw {
            let key = label.trim().to_lowercase();
            if key.is_empty() {
                return Err(CoreError::Validation("sensor label must not be empty".into()));
            }
            if sensors.insert(key.clone(), limits).is_some() {
                return Err(CoreError::Validation(format!(
                    "sensor label '{key}' is defined more than once"
                )));
            }
        }

        let spec = Self { sensors };
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (label, limits) in &self.sensors {
            for measurement in Measurement::ALL {
                if let Some(bounds) = limits.get(measurement) {
                    bounds.validate(&format!("{label}.{measurement}"))?;
                }
            }
        }
        Ok(())
    }

    pub fn limits_for(&self, label: &str) -> Option<&SensorLimits> {
        self.sensors.get(&label.trim().to_lowercase())
    }

    /// Whether `value` is at or beyond the sensor's own limit or the
    /// [`ALL_SENSORS`] limit for `measurement`.
    pub fn is_alarmed(&self, value: f64, measurement: Measurement, label: &str) -> bool {
        let fires = |limits: Option<&SensorLimits>| {
            limits
                .and_then(|l| l.get(measurement))
                .is_some_and(|b| b.is_at_limit(value))
        };
        fires(self.limits_for(label)) || fires(self.sensors.get(ALL_SENSORS))
    }

    /// [`is_alarmed`](Self::is_alarmed) for a value held as a decimal string.
    pub fn is_alarmed_str(
        &self,
        value: &str,
        measurement: Measurement,
        label: &str,
    ) -> Result<bool, CoreError> {
        let parsed: f64 = value.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{measurement} value '{value}' is not a number"))
        })?;
        Ok(self.is_alarmed(parsed, measurement, label))
    }
}
