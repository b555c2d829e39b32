// src/runner.rs

use std::io;

use anyhow::Result;
use tracing::Instrument;

use crate::classify::Classifier;
use crate::cli::Cli;
use crate::compose::{compose, parse_assertions, Identifiers};
use crate::config::Config;
use crate::engine::{NodeSandbox, Sandbox};
use crate::execution_id::ExecutionId;
use crate::model::Report;
use crate::report::{build_report, write_report};
use crate::util::resolve_input;

/// Entry point from `main.rs`.
///
/// Always writes exactly one document to stdout; an `Err` here means stdout
/// itself could not be written.
pub async fn run(cli: Cli) -> Result<()> {
    let cfg = Config::from_cli(&cli);
    let ids = match cli.channel_suffix.as_deref() {
        Some(suffix) => Identifiers::with_suffix(suffix),
        None => Identifiers::generate(),
    };

    let report = match load_inputs(&cli) {
        Ok((program, assertions)) => {
            let sandbox = NodeSandbox::new(&cfg);
            grade(&cfg, &program, &assertions, ids, &sandbox).await
        }
        Err(e) => Report::fatal(format!("{e:#}")),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report)
}

fn load_inputs(cli: &Cli) -> Result<(String, String)> {
    let program = resolve_input(cli.program.as_deref(), cli.program_file.as_ref(), "program")?;
    let assertions = resolve_input(
        cli.assertions.as_deref(),
        cli.assertions_file.as_ref(),
        "assertion list",
    )?;
    Ok((program, assertions))
}

/* ---------------- core pipeline ---------------- */

/// Compose, execute once, classify and build the report.
pub async fn grade<S: Sandbox>(
    cfg: &Config,
    program: &str,
    raw_assertions: &str,
    ids: Identifiers,
    sandbox: &S,
) -> Report {
    let execution_id = ExecutionId::new();
    let span = tracing::info_span!("grade", %execution_id);

    async move {
        let assertions = match parse_assertions(raw_assertions) {
            Ok(a) => a,
            Err(e) => {
                tracing::info!(error = %e, "assertion list rejected");
                return Report::fatal(e.to_string());
            }
        };

        let composed = compose(program, &assertions, ids);
        tracing::debug!(
            assertions = assertions.len(),
            preamble_lines = composed.preamble_lines,
            program_lines = composed.program_lines,
            "program composed"
        );

        let executed = sandbox.execute(&composed).await;
        let classifier = Classifier::new(&composed, cfg.timeout);
        build_report(&assertions, executed, &classifier)
    }
    .instrument(span)
    .await
}
