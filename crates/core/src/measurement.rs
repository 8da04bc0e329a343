//! Measurement kinds reported by each sensor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three values carried by every log record.
///
/// Serialized names match the keys used in threshold files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Temp,
    Humidity,
    Battery,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [
        Measurement::Temp,
        Measurement::Humidity,
        Measurement::Battery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Measurement::Temp => "temp",
            Measurement::Humidity => "humidity",
            Measurement::Battery => "battery",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
