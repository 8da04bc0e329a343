use std::path::PathBuf;

use clap::Parser;

/// Command-line flags. Paths and collaborator names come from the
/// environment (see [`crate::config::MonitorConfig`]).
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sensorwatch")]
#[command(
    about = "Watch per-sensor temperature logs and flag readings outside their limits",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Restart the logger service when readings stop arriving (slower default interval).
    #[arg(long)]
    pub system: bool,

    /// Periodically sync the log and label directories to the backup root.
    #[arg(long)]
    pub backup: bool,

    /// Show the UPS status line each cycle.
    #[arg(long)]
    pub ups: bool,

    /// Seconds between samples; rescales the averaging window.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Read labels and records from a JSON fixture instead of the filesystem.
    #[arg(long, value_name = "JSON")]
    pub fixture: Option<PathBuf>,

    /// Directory holding the logger's per-sensor files.
    pub folder: Option<PathBuf>,
}
