//! The sampling loop.
//!
//! [`Sampler`] owns the registry, trend tracker and threshold spec and does
//! the synchronous part of a cycle: resolve files, read and parse the newest
//! record per sensor, render. [`Monitor`] wraps it with the collaborators
//! (backup, restart, UPS) and the sleep between cycles.
//!
//! A record only feeds the trend tracker when it differs from the record seen
//! for that sensor on the previous read, so re-reading unchanged files leaves
//! the table unchanged.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;

use sensorwatch_core::record::parse_record;
use sensorwatch_core::registry::{SensorRegistry, SensorSample};
use sensorwatch_core::thresholds::ThresholdSpec;
use sensorwatch_core::trend::TrendTracker;
use sensorwatch_core::types::{SensorId, Timestamp};

use crate::backup::{BackupJob, BackupReport};
use crate::command::{CommandError, CommandOutput, CommandRunner, SystemRunner};
use crate::render::{render_table, RenderedTable};
use crate::restart::restart_service;
use crate::source::{DataSource, SensorFile};
use crate::ups::UpsMonitor;

/// Counts from one read pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Sensors whose record changed and was applied.
    pub updated: usize,
    /// Sensors whose record was the same as last time.
    pub unchanged: usize,
    /// Sensors with no record or a malformed one.
    pub skipped: usize,
}

pub struct Sampler<S: DataSource> {
    source: S,
    thresholds: ThresholdSpec,
    registry: SensorRegistry,
    trends: TrendTracker,
    files: Vec<SensorFile>,
    last_records: HashMap<SensorId, String>,
}

impl<S: DataSource> Sampler<S> {
    /// Seeds the registry from the source's label map.
    pub fn new(source: S, thresholds: ThresholdSpec, average_window: f64) -> Self {
        let registry = SensorRegistry::from_labels(&source.label_entries());
        tracing::info!(sensors = registry.len(), "Label map loaded");

        Self {
            registry,
            source,
            thresholds,
            trends: TrendTracker::new(average_window),
            files: Vec::new(),
            last_records: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn trends(&self) -> &TrendTracker {
        &self.trends
    }

    pub fn files(&self) -> &[SensorFile] {
        &self.files
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Re-resolve the file set. Returns `true` when it changed.
    pub fn refresh_files(&mut self) -> bool {
        let files = self.source.list_sensor_files();
        if files == self.files {
            return false;
        }

        let paths: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();
        tracing::info!(count = files.len(), ?paths, "Data files changed");
        self.files = files;
        true
    }

    /// Read the newest record of every resolved file and apply it.
    ///
    /// A missing or malformed record is logged and skipped; the sensor keeps
    /// its previous sample.
    pub fn read_sensors(&mut self) -> ReadStats {
        let mut stats = ReadStats::default();

        for file in &self.files {
            let Some(line) = self.source.read_latest_record(file) else {
                stats.skipped += 1;
                continue;
            };

            if self.last_records.get(&file.sensor_id) == Some(&line) {
                stats.unchanged += 1;
                continue;
            }

            let record = match parse_record(&line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(sensor_id = %file.sensor_id, error = %e, "Skipping record");
                    stats.skipped += 1;
                    continue;
                }
            };

            let temperature_f = record.temperature_f();
            let trend = self.trends.update(&file.sensor_id, temperature_f);
            tracing::debug!(
                sensor_id = %file.sensor_id,
                temperature_f,
                average = trend.average,
                delta = trend.delta,
                "Sensor updated",
            );

            self.registry
                .record_sample(&file.sensor_id, SensorSample::from_record(&record), trend.marker);
            self.last_records.insert(file.sensor_id.clone(), line);
            stats.updated += 1;
        }

        stats
    }

    pub fn render(&self, now: Timestamp) -> RenderedTable {
        render_table(&self.registry, &self.thresholds, now)
    }

    /// Resolve, read and render.
    pub fn sample(&mut self, now: Timestamp) -> RenderedTable {
        self.refresh_files();
        let stats = self.read_sensors();
        tracing::debug!(
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            "Read pass complete",
        );
        self.render(now)
    }
}

/// Optional behaviour layered on top of sampling.
#[derive(Debug, Clone, Default)]
pub struct Collaborators {
    pub backup: Option<BackupJob>,
    /// Service restarted when a sensor is stale (system mode).
    pub restart_service: Option<String>,
    pub ups: Option<UpsMonitor>,
}

/// What one cycle did besides rendering.
#[derive(Debug)]
pub struct CycleReport {
    pub table: RenderedTable,
    /// Set when the backup countdown fired this cycle.
    pub backup: Option<BackupReport>,
    /// Set when a restart was attempted this cycle.
    pub restart: Option<Result<CommandOutput, CommandError>>,
    pub ups_line: Option<String>,
}

pub struct Monitor<S: DataSource, R: CommandRunner = SystemRunner> {
    sampler: Sampler<S>,
    collaborators: Collaborators,
    runner: R,
    interval: Duration,
}

impl<S: DataSource, R: CommandRunner> Monitor<S, R> {
    pub fn new(
        sampler: Sampler<S>,
        collaborators: Collaborators,
        runner: R,
        interval: Duration,
    ) -> Self {
        Self {
            sampler,
            collaborators,
            runner,
            interval,
        }
    }

    /// One full cycle: backup if due, sample and print, restart the logger
    /// on stale data, print the UPS line.
    ///
    /// Collaborator failures are logged and reported, never propagated.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let backup = match self.collaborators.backup.as_mut() {
            Some(job) => job.tick(&self.runner).await,
            None => None,
        };

        let table = self.sampler.sample(Utc::now());
        println!();
        print!("{}", table.text);

        let mut restart = None;
        if table.any_stale() {
            if let Some(service) = self.collaborators.restart_service.as_deref() {
                tracing::warn!(stale = ?table.stale, "Stale sensors detected");
                let outcome = restart_service(&self.runner, service).await;
                match &outcome {
                    Ok(out) => {
                        tracing::info!(service, duration_ms = out.duration_ms, "Logger restarted")
                    }
                    Err(e) => tracing::debug!(service, error = %e, "Logger restart failed"),
                }
                restart = Some(outcome);
            }
        }

        let ups_line = match self.collaborators.ups.as_mut() {
            Some(ups) => {
                let line = ups.poll(&self.runner).await;
                println!("{line}");
                Some(line)
            }
            None => None,
        };

        CycleReport {
            table,
            backup,
            restart,
            ups_line,
        }
    }

    /// Run cycles forever, sleeping `interval` between them.
    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Sampling loop started");
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
