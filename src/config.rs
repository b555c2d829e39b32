// src/config.rs

use std::time::Duration;

use crate::cli::Cli;

/// Default execution timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Heap ceiling handed to the runtime (`--max-old-space-size`).
pub const DEFAULT_HEAP_LIMIT_MB: u64 = 256;

/// Resolved configuration for one invocation.
///
/// Only the timeout and the runtime binary are externally tunable; both come
/// from CLI flags with environment fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    /// Wall-clock budget for the composed program.
    pub timeout: Duration,

    /// Runtime binary configuration
    pub runtime: Runtime,
}

/// Runtime binary configuration.
#[derive(Debug, Clone)]
pub struct Runtime {
    /// Node binary, resolved through PATH when not absolute.
    pub node: String,

    pub heap_limit_mb: u64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            node: default_node(),
            heap_limit_mb: DEFAULT_HEAP_LIMIT_MB,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            runtime: Runtime::default(),
        }
    }
}

fn default_node() -> String {
    "node".to_string()
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            timeout: Duration::from_millis(cli.timeout_ms),
            runtime: Runtime {
                node: cli.node.clone(),
                ..Runtime::default()
            },
        }
    }
}
