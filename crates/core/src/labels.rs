//! Label map parsing.
//!
//! One sensor per line: `A4:C1:38:E7:2A:5F\tGarden (A4:C1:38:E7:2A:5F)`.
//! The display label is the text before the first `(`.

use crate::error::CoreError;
use crate::types::{normalize_sensor_id, SensorId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub sensor_id: SensorId,
    pub label: String,
}

pub fn parse_label_line(line: &str) -> Result<LabelEntry, CoreError> {
    let err = |reason: &str| CoreError::LabelMap {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let (address, title) = line
        .trim()
        .split_once('\t')
        .ok_or_else(|| err("missing tab separator"))?;

    let sensor_id = normalize_sensor_id(address)
        .ok_or_else(|| err("address is not a 12-digit hardware address"))?;

    let label = title.split('(').next().unwrap_or_default().trim();
    if label.is_empty() {
        return Err(err("empty label"));
    }

    Ok(LabelEntry {
        sensor_id,
        label: label.to_string(),
    })
}

/// Parse every line of a label map, in file order.
///
/// Blank lines are ignored; malformed lines are logged and skipped.
pub fn parse_label_map(text: &str) -> Vec<LabelEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_label_line(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping label map line");
                None
            }
        })
        .collect()
}
