//! Periodic directory backup.
//!
//! Every `every` cycles (starting with the first) each [`SyncPair`] is
//! mirrored with `rsync`. A failed sync is logged and does not stop the
//! remaining pairs or the sampling loop.

use std::path::PathBuf;

use crate::command::CommandRunner;

/// One source directory mirrored into one destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPair {
    pub title: String,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl SyncPair {
    pub fn new(title: &str, source: PathBuf, destination: PathBuf) -> Self {
        Self {
            title: title.to_string(),
            source,
            destination,
        }
    }

    /// `rsync` arguments. Both paths get a trailing slash so directory
    /// contents are synced rather than the directory itself.
    pub fn rsync_args(&self) -> Vec<String> {
        let with_slash = |p: &PathBuf| {
            let s = p.display().to_string();
            if s.ends_with('/') {
                s
            } else {
                format!("{s}/")
            }
        };

        vec![
            "-arvWutpO".to_string(),
            "--modify-window=61".to_string(),
            "--ignore-errors".to_string(),
            with_slash(&self.source),
            with_slash(&self.destination),
        ]
    }
}

/// Countdown deciding which cycles run a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSchedule {
    every: u64,
    countdown: u64,
}

impl BackupSchedule {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            countdown: 0,
        }
    }

    /// Advance one cycle; `true` when this cycle should back up.
    pub fn tick(&mut self) -> bool {
        let due = self.countdown == 0;
        if due {
            self.countdown = self.every;
        }
        self.countdown -= 1;
        due
    }

    /// Cycles left before the next backup.
    pub fn remaining(&self) -> u64 {
        self.countdown
    }
}

/// Outcome of one backup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupReport {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct BackupJob {
    pairs: Vec<SyncPair>,
    schedule: BackupSchedule,
}

impl BackupJob {
    pub fn new(pairs: Vec<SyncPair>, every: u64) -> Self {
        Self {
            pairs,
            schedule: BackupSchedule::new(every),
        }
    }

    pub fn schedule(&self) -> &BackupSchedule {
        &self.schedule
    }

    /// Run the backup if this cycle is due.
    pub async fn tick<R: CommandRunner>(&mut self, runner: &R) -> Option<BackupReport> {
        if !self.schedule.tick() {
            tracing::debug!(remaining = self.schedule.remaining(), "Backup not due");
            return None;
        }
        Some(self.run_now(runner).await)
    }

    pub async fn run_now<R: CommandRunner>(&self, runner: &R) -> BackupReport {
        tracing::info!(pairs = self.pairs.len(), "Starting backup");
        let mut report = BackupReport::default();

        for pair in &self.pairs {
            match runner.run("rsync", &pair.rsync_args(), &pair.title).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    tracing::debug!(title = %pair.title, error = %e, "Sync pair failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Backup finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_due_then_every_n() {
        let mut schedule = BackupSchedule::new(3);
        let due: Vec<bool> = (0..7).map(|_| schedule.tick()).collect();
        assert_eq!(due, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn every_cycle_when_interval_is_one() {
        let mut schedule = BackupSchedule::new(1);
        assert!(schedule.tick());
        assert!(schedule.tick());
        assert!(schedule.tick());
    }

    #[test]
    fn zero_interval_is_treated_as_one() {
        let mut schedule = BackupSchedule::new(0);
        assert!(schedule.tick());
        assert!(schedule.tick());
    }

    #[test]
    fn rsync_args_sync_directory_contents() {
        let pair = SyncPair::new(
            "Backup Log",
            PathBuf::from("/var/log/logger"),
            PathBuf::from("/mnt/backup/log/"),
        );
        let args = pair.rsync_args();
        assert_eq!(args[args.len() - 2], "/var/log/logger/");
        assert_eq!(args[args.len() - 1], "/mnt/backup/log/");
        assert!(args.contains(&"--modify-window=61".to_string()));
    }
}
