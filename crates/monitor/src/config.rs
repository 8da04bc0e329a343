//! Process configuration, read once at startup.
//!
//! Paths and collaborator names come from environment variables (a `.env`
//! file is honoured); operating modes come from [`Cli`].

use std::path::PathBuf;
use std::time::Duration;

use crate::backup::SyncPair;
use crate::cli::Cli;
use sensorwatch_core::trend::DEFAULT_AVERAGE_WINDOW;

/// Sampling interval without flags.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Sampling interval in system mode.
pub const SYSTEM_INTERVAL: Duration = Duration::from_secs(60 * 60 * 2);

/// Wall-clock period between backups.
pub const BACKUP_PERIOD: Duration = Duration::from_secs(60 * 60 * 2);

const DEFAULT_LOG_DIR: &str = "/var/log/goveebttemplogger";
const DEFAULT_LABEL_MAP: &str = "/var/www/html/goveebttemplogger/gvh-titlemap.txt";
const DEFAULT_SERVICE: &str = "goveebttemplogger";
const DEFAULT_BACKUP_ROOT: &str = "/mnt/macExtern/temp-temp/Govee";
const DEFAULT_UPS_NAME: &str = "myups@localhost";
const DEFAULT_LOG_FILE: &str = "sensorwatch.log";

/// Cycle timing derived from the operating mode and `--interval`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub interval: Duration,
    /// Trend averaging window, in cycles.
    pub average_window: f64,
    /// Cycles between backups, when backup mode is on.
    pub backup_every: Option<u64>,
}

impl Schedule {
    /// Overriding the interval scales the averaging window by
    /// `old / new` so it still covers the same wall-clock span. The backup
    /// cadence is derived from the final interval.
    pub fn resolve(system: bool, backup: bool, interval_override: Option<i64>) -> Self {
        let mut interval = if system { SYSTEM_INTERVAL } else { DEFAULT_INTERVAL };
        let mut average_window = DEFAULT_AVERAGE_WINDOW;

        if let Some(secs) = interval_override {
            let secs = secs.max(1) as u64;
            let ratio = interval.as_secs_f64() / secs as f64;
            average_window *= ratio;
            interval = Duration::from_secs(secs);
        }

        let backup_every = backup.then(|| (BACKUP_PERIOD.as_secs() / interval.as_secs()).max(1));

        Self {
            interval,
            average_window,
            backup_every,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub log_dir: PathBuf,
    pub label_map: PathBuf,
    /// JSON threshold file; built-in limits when unset.
    pub thresholds_file: Option<PathBuf>,
    pub service_name: String,
    pub backup_root: PathBuf,
    pub ups_name: String,
    pub log_file: PathBuf,
    pub log_json: bool,
    pub system: bool,
    pub ups: bool,
    pub fixture: Option<PathBuf>,
    pub schedule: Schedule,
}

impl MonitorConfig {
    /// Build the configuration from CLI flags and the environment.
    ///
    /// | Env Var                   | Default                                            |
    /// |---------------------------|----------------------------------------------------|
    /// | `SENSORWATCH_LOG_DIR`     | `/var/log/goveebttemplogger`                       |
    /// | `SENSORWATCH_LABEL_MAP`   | `/var/www/html/goveebttemplogger/gvh-titlemap.txt` |
    /// | `SENSORWATCH_THRESHOLDS`  | unset (built-in limits)                            |
    /// | `SENSORWATCH_SERVICE`     | `goveebttemplogger`                                |
    /// | `SENSORWATCH_BACKUP_ROOT` | `/mnt/macExtern/temp-temp/Govee`                   |
    /// | `SENSORWATCH_UPS_NAME`    | `myups@localhost`                                  |
    /// | `SENSORWATCH_LOG_FILE`    | `sensorwatch.log`                                  |
    /// | `SENSORWATCH_LOG_JSON`    | unset (plain text log lines)                       |
    ///
    /// The positional folder argument takes precedence over `SENSORWATCH_LOG_DIR`.
    pub fn from_cli_and_env(cli: &Cli) -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let log_dir = cli
            .folder
            .clone()
            .or_else(|| env("SENSORWATCH_LOG_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

        let log_json = env("SENSORWATCH_LOG_JSON")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            log_dir,
            label_map: env("SENSORWATCH_LABEL_MAP")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LABEL_MAP)),
            thresholds_file: env("SENSORWATCH_THRESHOLDS").map(PathBuf::from),
            service_name: env("SENSORWATCH_SERVICE").unwrap_or_else(|| DEFAULT_SERVICE.into()),
            backup_root: env("SENSORWATCH_BACKUP_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_ROOT)),
            ups_name: env("SENSORWATCH_UPS_NAME").unwrap_or_else(|| DEFAULT_UPS_NAME.into()),
            log_file: env("SENSORWATCH_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            log_json,
            system: cli.system,
            ups: cli.ups,
            fixture: cli.fixture.clone(),
            schedule: Schedule::resolve(cli.system, cli.backup, cli.interval),
        }
    }

    /// Directories synced on each backup: the sensor logs and the directory
    /// holding the label map.
    pub fn backup_pairs(&self) -> Vec<SyncPair> {
        let mut pairs = vec![SyncPair::new(
            "Backup Log",
            self.log_dir.clone(),
            self.backup_root.join("log"),
        )];
        if let Some(label_dir) = self.label_map.parent() {
            pairs.push(SyncPair::new(
                "Backup HTML",
                label_dir.to_path_buf(),
                self.backup_root.join("html"),
            ));
        }
        pairs
    }

    pub fn log_summary(&self) {
        tracing::info!(
            log_dir = %self.log_dir.display(),
            label_map = %self.label_map.display(),
            interval_secs = self.schedule.interval.as_secs(),
            average_window = self.schedule.average_window,
            system = self.system,
            backup_every = ?self.schedule.backup_every,
            ups = self.ups,
            fixture = ?self.fixture,
            "Starting sensorwatch",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let schedule = Schedule::resolve(false, false, None);
        assert_eq!(schedule.interval, DEFAULT_INTERVAL);
        assert_eq!(schedule.average_window, DEFAULT_AVERAGE_WINDOW);
        assert_eq!(schedule.backup_every, None);
    }

    #[test]
    fn system_mode_slows_sampling() {
        let schedule = Schedule::resolve(true, false, None);
        assert_eq!(schedule.interval, SYSTEM_INTERVAL);
        assert_eq!(schedule.average_window, DEFAULT_AVERAGE_WINDOW);
    }

    #[test]
    fn interval_override_rescales_average_window() {
        let schedule = Schedule::resolve(false, false, Some(30));
        assert_eq!(schedule.interval, Duration::from_secs(30));
        assert_eq!(schedule.average_window, 120.0);

        let schedule = Schedule::resolve(false, false, Some(120));
        assert_eq!(schedule.average_window, 30.0);
    }

    #[test]
    fn non_positive_interval_is_clamped() {
        let schedule = Schedule::resolve(false, false, Some(0));
        assert_eq!(schedule.interval, Duration::from_secs(1));
        assert_eq!(schedule.average_window, 3600.0);
    }

    #[test]
    fn backup_cadence_follows_interval() {
        assert_eq!(Schedule::resolve(false, true, None).backup_every, Some(120));
        assert_eq!(Schedule::resolve(false, true, Some(30)).backup_every, Some(240));
        assert_eq!(Schedule::resolve(true, true, None).backup_every, Some(1));
        assert_eq!(Schedule::resolve(false, true, Some(86_400)).backup_every, Some(1));
    }

    #[test]
    fn backup_pairs_cover_logs_and_label_directory() {
        let config = MonitorConfig {
            log_dir: PathBuf::from("/var/log/logger"),
            label_map: PathBuf::from("/srv/html/titles.txt"),
            thresholds_file: None,
            service_name: "logger".into(),
            backup_root: PathBuf::from("/mnt/backup"),
            ups_name: "ups@localhost".into(),
            log_file: PathBuf::from("sensorwatch.log"),
            log_json: false,
            system: false,
            ups: false,
            fixture: None,
            schedule: Schedule::resolve(false, true, None),
        };

        let pairs = config.backup_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source, PathBuf::from("/var/log/logger"));
        assert_eq!(pairs[0].destination, PathBuf::from("/mnt/backup/log"));
        assert_eq!(pairs[1].source, PathBuf::from("/srv/html"));
        assert_eq!(pairs[1].destination, PathBuf::from("/mnt/backup/html"));
    }
}
