use chrono::Duration;

use crate::types::Timestamp;

/// Minutes without a new sample before a sensor counts as stale.
pub const STALE_AFTER_MINUTES: i64 = 10;

/// A sample is stale when it is more than [`STALE_AFTER_MINUTES`] away from
/// `now` in either direction, so a clock stepped backwards is caught too.
/// Exactly ten minutes is not stale.
pub fn is_stale(sampled_at: Timestamp, now: Timestamp) -> bool {
    (now - sampled_at).abs() > Duration::minutes(STALE_AFTER_MINUTES)
}
