// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_TIMEOUT_MS;

/// Run an untrusted JavaScript submission in an isolated VM and judge it
/// against a list of assertions.
///
/// Prints exactly one JSON document to stdout:
/// `{"tests": [...]}` or `{"error": "..."}`.
#[derive(Parser, Debug)]
#[command(name = "vmgrade", version)]
pub struct Cli {
    /// Submitted program source
    #[arg(required_unless_present = "program_file", conflicts_with = "program_file")]
    pub program: Option<String>,

    /// Assertion list as JSON: [{"id": 1, "assertion": "...", "is_public": true}]
    #[arg(
        required_unless_present = "assertions_file",
        conflicts_with = "assertions_file"
    )]
    pub assertions: Option<String>,

    /// Read the submitted program from a file
    #[arg(long)]
    pub program_file: Option<PathBuf>,

    /// Read the assertion list from a JSON file
    #[arg(long)]
    pub assertions_file: Option<PathBuf>,

    /// Execution timeout in milliseconds
    #[arg(
        long,
        env = "VMGRADE_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_ms: u64,

    /// Node.js binary used as the isolation runtime
    #[arg(long, env = "VMGRADE_NODE", default_value = "node")]
    pub node: String,

    /// Pin the harness identifier suffix (reproducing a run)
    #[arg(long, hide = true, value_parser = parse_suffix)]
    pub channel_suffix: Option<String>,
}

fn parse_suffix(raw: &str) -> Result<String, String> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(raw.to_string())
    } else {
        Err("suffix must be non-empty and contain only ASCII letters, digits or '_'".to_string())
    }
}
