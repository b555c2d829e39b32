// src/errors.rs

//! Fatal failure taxonomy.
//!
//! Every variant aborts the run and is reported as `{"error": <Display>}`.
//! Assertion-level failures never appear here; they stay inside their
//! `OutcomeRecord`.

use std::time::Duration;

use thiserror::Error;

pub const TAMPER_MESSAGE: &str =
    "Tamper detected: the submitted program froze the grading output channel";

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The assertion list could not be decoded or validated.
    #[error("Invalid assertion list: {0}")]
    Composition(String),

    /// Execution exceeded the wall-clock budget.
    #[error("Execution timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The submitted program made the output channel immutable.
    #[error("{}", TAMPER_MESSAGE)]
    Tamper,

    /// Uncaught throw outside any guarded unit, already formatted.
    #[error("{0}")]
    Runtime(String),

    #[error("Unable to start the JavaScript runtime: {0}")]
    Launch(#[source] std::io::Error),

    #[error("Execution exceeded the memory limit")]
    OutOfMemory,

    #[error("Execution aborted: the runtime exited unexpectedly ({0})")]
    RuntimeCrashed(String),

    #[error("Execution aborted: unreadable runtime report ({0})")]
    Protocol(String),

    #[error("Execution aborted: the grading output channel was corrupted ({0})")]
    ChannelCorrupted(String),

    /// Host-side I/O while staging the run (temp files, pipes).
    #[error("Execution aborted: {0}")]
    Staging(#[from] std::io::Error),
}

impl HarnessError {
    /// Short machine-friendly label, used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Composition(_) => "composition",
            HarnessError::Timeout(_) => "timeout",
            HarnessError::Tamper => "tamper",
            HarnessError::Runtime(_) => "runtime",
            HarnessError::Launch(_) => "launch",
            HarnessError::OutOfMemory => "out_of_memory",
            HarnessError::RuntimeCrashed(_) => "crashed",
            HarnessError::Protocol(_) => "protocol",
            HarnessError::ChannelCorrupted(_) => "channel_corrupted",
            HarnessError::Staging(_) => "staging",
        }
    }
}
