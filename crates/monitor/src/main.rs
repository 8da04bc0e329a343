//! `sensorwatch` -- terminal monitor for per-sensor temperature logs.
//!
//! Samples the newest record of each sensor's log file on a fixed interval,
//! prints a colored status table, and optionally restarts the logger service
//! when data stops arriving (`--system`), backs up the data directories
//! (`--backup`) and shows the UPS state (`--ups`).
//!
//! Configuration is read from the environment (see
//! [`MonitorConfig::from_cli_and_env`]); a `.env` file is honoured.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sensorwatch_core::thresholds::ThresholdSpec;
use sensorwatch_monitor::backup::BackupJob;
use sensorwatch_monitor::cli::Cli;
use sensorwatch_monitor::command::SystemRunner;
use sensorwatch_monitor::config::MonitorConfig;
use sensorwatch_monitor::sampler::{Collaborators, Monitor, Sampler};
use sensorwatch_monitor::source::{DataSource, FixtureSource, FsSource};
use sensorwatch_monitor::ups::UpsMonitor;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = MonitorConfig::from_cli_and_env(&cli);

    init_tracing(&config)?;
    config.log_summary();

    let thresholds = match &config.thresholds_file {
        Some(path) => ThresholdSpec::load(path)
            .with_context(|| format!("Invalid threshold file {}", path.display()))?,
        None => ThresholdSpec::builtin(),
    };

    match &config.fixture {
        Some(path) => {
            let source = FixtureSource::load(path)
                .with_context(|| format!("Invalid fixture {}", path.display()))?;
            run(source, thresholds, &config).await
        }
        None => {
            let source = FsSource::new(config.log_dir.clone(), config.label_map.clone());
            run(source, thresholds, &config).await
        }
    }

    Ok(())
}

async fn run<S: DataSource>(source: S, thresholds: ThresholdSpec, config: &MonitorConfig) {
    let sampler = Sampler::new(source, thresholds, config.schedule.average_window);

    let collaborators = Collaborators {
        backup: config
            .schedule
            .backup_every
            .map(|every| BackupJob::new(config.backup_pairs(), every)),
        restart_service: config.system.then(|| config.service_name.clone()),
        ups: config.ups.then(|| UpsMonitor::new(&config.ups_name)),
    };

    Monitor::new(sampler, collaborators, SystemRunner, config.schedule.interval)
        .run()
        .await;
}

/// File log with every event allowed by `RUST_LOG`, plus WARN and above on
/// stderr. Stdout is reserved for the table.
fn init_tracing(config: &MonitorConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Cannot open log file {}", config.log_file.display()))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "sensorwatch=info,sensorwatch_monitor=info,sensorwatch_core=info".into()
    });

    let (json_layer, text_layer) = if config.log_json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(Mutex::new(file));
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(LevelFilter::WARN),
        )
        .init();

    Ok(())
}
