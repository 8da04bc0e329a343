/// Sensor identifiers are the 12-character uppercase hex form of the
/// hardware address with separators stripped (e.g. `A4C138E72A5F`).
pub type SensorId = String;

/// All parsed sample timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Length of a sensor identifier in hex characters.
pub const SENSOR_ID_LEN: usize = 12;

/// Normalise a hardware address (`A4:C1:38:E7:2A:5F`, `a4c138e72a5f`, ...)
/// into a [`SensorId`].
///
/// Returns `None` unless the result is exactly [`SENSOR_ID_LEN`] hex digits.
pub fn normalize_sensor_id(raw: &str) -> Option<SensorId> {
    let id: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .collect::<String>()
        .to_ascii_uppercase();

    if id.len() == SENSOR_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(id)
    } else {
        None
    }
}
