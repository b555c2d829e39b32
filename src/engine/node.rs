// src/engine/node.rs

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tempfile::tempdir;
use tokio::process::Command as TokioCommand;

use crate::compose::ComposedProgram;
use crate::config::Config;
use crate::engine::protocol::{parse_report, ShimReport};
use crate::engine::Sandbox;
use crate::errors::HarnessError;
use crate::metrics::{MemoryTracker, SAMPLE_EVERY};
use crate::shim::{node_shim, SCRIPT_NAME, SHIM_FILE};

/// Time allowed for the runtime to boot on top of the execution timeout
/// before the host kills it.
pub const STARTUP_ALLOWANCE: Duration = Duration::from_millis(2000);

/// Runs composed programs in a Node.js `vm` context, one child per run.
#[derive(Debug, Clone)]
pub struct NodeSandbox {
    node: String,
    heap_limit_mb: u64,
    timeout: Duration,
}

impl NodeSandbox {
    pub fn new(cfg: &Config) -> Self {
        Self {
            node: cfg.runtime.node.clone(),
            heap_limit_mb: cfg.runtime.heap_limit_mb,
            timeout: cfg.timeout,
        }
    }

    /// Host-side kill deadline.
    pub fn hard_deadline(&self) -> Duration {
        self.timeout + STARTUP_ALLOWANCE
    }
}

impl Sandbox for NodeSandbox {
    async fn execute(&self, program: &ComposedProgram) -> Result<ShimReport, HarnessError> {
        let tmp = tempdir()?;

        let shim_path = tmp.path().join(SHIM_FILE);
        std::fs::write(&shim_path, node_shim())?;
        let program_path = tmp.path().join(SCRIPT_NAME);
        std::fs::write(&program_path, &program.source)?;

        let mut cmd = TokioCommand::new(&self.node);
        cmd.arg("--disallow-code-generation-from-strings")
            .arg(format!("--max-old-space-size={}", self.heap_limit_mb))
            .arg(&shim_path)
            .arg(&program_path)
            .arg(self.timeout.as_millis().to_string())
            .arg(&program.identifiers.capture_global)
            .arg(&program.identifiers.assert_global)
            .arg(&program.identifiers.assertion_error_global)
            .env_remove("NODE_OPTIONS")
            .current_dir(tmp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = cmd.spawn().map_err(HarnessError::Launch)?;
        let mem = child.id().map(|pid| MemoryTracker::start(pid, SAMPLE_EVERY));

        // Dropping the wait future on expiry drops the child, which kills it.
        let waited = tokio::time::timeout(self.hard_deadline(), child.wait_with_output()).await;
        let max_rss_kb = mem.and_then(MemoryTracker::stop_and_take);
        let duration_ms = start.elapsed().as_millis() as u64;

        let output = match waited {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!(duration_ms, ?max_rss_kb, "runtime killed at hard deadline");
                return Err(HarnessError::Timeout(self.timeout));
            }
        };

        tracing::debug!(
            duration_ms,
            ?max_rss_kb,
            status = %output.status,
            "runtime finished"
        );

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim_end(), "runtime stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(crash_error(output.status, &stderr));
        }
        parse_report(&stdout)
    }
}

/// Classify a runtime that exited without writing its report.
fn crash_error(status: ExitStatus, stderr: &str) -> HarnessError {
    if stderr.contains("heap out of memory") || stderr.contains("Allocation failed") {
        HarnessError::OutOfMemory
    } else {
        HarnessError::RuntimeCrashed(status.to_string())
    }
}
