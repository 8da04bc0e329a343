//! Per-sensor temperature trend tracking.
//!
//! Each sensor keeps an exponential moving average. The difference between a
//! new reading and the average before it is folded in decides the marker.

use std::collections::HashMap;

use crate::types::SensorId;

/// Default number of cycles averaged over.
pub const DEFAULT_AVERAGE_WINDOW: f64 = 60.0;

/// `|delta|` at or below this is steady.
pub const QUIET_DELTA_F: f64 = 0.2;

/// `|delta|` at or above this is emphasised.
pub const ACTIVE_DELTA_F: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Steady,
    Rising,
    Falling,
}

impl Direction {
    pub fn glyph(self) -> char {
        match self {
            Direction::Steady => ' ',
            Direction::Rising => '∧',
            Direction::Falling => '∨',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendMarker {
    pub direction: Direction,
    /// Swing large enough to be rendered with alarm emphasis.
    pub active: bool,
}

impl TrendMarker {
    pub fn classify(delta: f64, quiet: f64, active: f64) -> Self {
        let magnitude = delta.abs();
        let direction = if magnitude <= quiet {
            Direction::Steady
        } else if delta > 0.0 {
            Direction::Rising
        } else {
            Direction::Falling
        };
        Self {
            direction,
            active: magnitude >= active,
        }
    }
}

/// Result of feeding one reading into the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendUpdate {
    /// Average after this reading was folded in.
    pub average: f64,
    /// Reading minus the average before this reading.
    pub delta: f64,
    pub marker: TrendMarker,
}

#[derive(Debug, Clone)]
pub struct TrendTracker {
    window: f64,
    quiet: f64,
    active: f64,
    averages: HashMap<SensorId, f64>,
}

impl Default for TrendTracker {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_WINDOW)
    }
}

impl TrendTracker {
    /// A window below 1 cycle is clamped to 1 (the average then follows the
    /// latest reading exactly).
    pub fn new(window: f64) -> Self {
        Self::with_thresholds(window, QUIET_DELTA_F, ACTIVE_DELTA_F)
    }

    pub fn with_thresholds(window: f64, quiet: f64, active: f64) -> Self {
        Self {
            window: if window.is_finite() { window.max(1.0) } else { DEFAULT_AVERAGE_WINDOW },
            quiet,
            active,
            averages: HashMap::new(),
        }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn average(&self, sensor_id: &str) -> Option<f64> {
        self.averages.get(sensor_id).copied()
    }

    pub fn update(&mut self, sensor_id: &str, temperature_f: f64) -> TrendUpdate {
        let current = self.average(sensor_id).unwrap_or(temperature_f);
        let delta = temperature_f - current;
        let average = current + delta / self.window;
        self.averages.insert(sensor_id.to_string(), average);

        TrendUpdate {
            average,
            delta,
            marker: TrendMarker::classify(delta, self.quiet, self.active),
        }
    }
}
