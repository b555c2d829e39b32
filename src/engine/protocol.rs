// src/engine/protocol.rs

//! Wire format between the runtime shim and the host.
//!
//! The shim prints exactly one JSON line:
//!
//! {"status":"completed","outcomes":[{"id":1,"assertion":"...","public":true,"passed":false,"failure":{...}}]}
//! {"status":"failed","failure":{"message":"...","stack":"..."}}

use serde::Deserialize;

use crate::classify::RawFailure;
use crate::errors::HarnessError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ShimReport {
    /// The composed program ran to completion; one outcome per guarded unit.
    Completed { outcomes: Vec<RawOutcome> },

    /// A throw escaped every guarded unit (including the tamper check and
    /// the runtime's own timeout).
    Failed { failure: RawFailure },
}

/// One guarded unit's verdict before formatting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawOutcome {
    pub id: i64,
    pub assertion: String,
    pub public: bool,
    pub passed: bool,

    #[serde(default)]
    pub failure: Option<RawFailure>,
}

/// Parse the shim's report from captured stdout.
///
/// Only the last non-empty line is considered.
pub fn parse_report(stdout: &str) -> Result<ShimReport, HarnessError> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| HarnessError::Protocol("no report emitted".to_string()))?;

    serde_json::from_str(line.trim()).map_err(|e| HarnessError::Protocol(e.to_string()))
}
