// src/main.rs

//! vmgrade
//!
//! Entry point for the grading harness binary.
//!
//! Runs an untrusted JavaScript submission inside an isolated Node.js VM,
//! evaluates grader-authored assertions against the resulting state and
//! prints one JSON document: `{"tests": [...]}` or `{"error": "..."}`.
//!
//! Responsibilities of this file:
//! - Initialise logging (stderr only)
//! - Parse CLI arguments
//! - Hand off to the runner

mod classify;
mod cli;
mod compose;
mod config;
mod engine;
mod errors;
mod execution_id;
mod harness;
mod metrics;
mod model;
mod report;
mod runner;
mod shim;
mod telemetry;
mod util;

use anyhow::Result;
use clap::Parser;

/// Program entry point.
///
/// Uses Tokio because the engine spawns and waits on the runtime child
/// process asynchronously, under a deadline.
#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let cli = cli::Cli::parse();

    runner::run(cli).await
}
