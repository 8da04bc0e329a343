//! `sensorwatch-core` -- pure domain logic for the sensor log monitor.
//!
//! Nothing here spawns processes or writes to the terminal; the
//! `sensorwatch-monitor` crate drives these pieces from its sampling loop.

pub mod error;
pub mod files;
pub mod labels;
pub mod measurement;
pub mod record;
pub mod registry;
pub mod staleness;
pub mod tail;
pub mod thresholds;
pub mod trend;
pub mod types;
