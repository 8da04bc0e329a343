//! `sensorwatch-monitor` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod backup;
pub mod cli;
pub mod command;
pub mod config;
pub mod render;
pub mod restart;
pub mod sampler;
pub mod source;
pub mod ups;
