// src/report.rs

//! Result serializer.
//!
//! Turns the engine's outcome into the single output document and writes it.
//! Records are rebuilt from the caller's assertion list; the runtime only
//! contributes verdicts and raw failures, and those must line up one to one
//! with the input.

use std::io::Write;

use anyhow::{Context, Result};

use crate::classify::Classifier;
use crate::engine::{RawOutcome, ShimReport};
use crate::errors::HarnessError;
use crate::model::{Assertion, OutcomeRecord, Report};

/// Map the runtime's outcomes onto records, in input order.
pub fn outcome_records(
    assertions: &[Assertion],
    outcomes: &[RawOutcome],
    classifier: &Classifier<'_>,
) -> Result<Vec<OutcomeRecord>, HarnessError> {
    if outcomes.len() != assertions.len() {
        return Err(HarnessError::ChannelCorrupted(format!(
            "expected {} outcomes, got {}",
            assertions.len(),
            outcomes.len()
        )));
    }

    assertions
        .iter()
        .zip(outcomes)
        .map(|(assertion, outcome)| {
            if outcome.id != assertion.id
                || outcome.assertion != assertion.assertion
                || outcome.public != assertion.is_public
            {
                return Err(HarnessError::ChannelCorrupted(format!(
                    "outcome for id {} out of order",
                    assertion.id
                )));
            }

            if outcome.passed {
                return Ok(OutcomeRecord::passed(assertion));
            }

            let error = match &outcome.failure {
                Some(failure) => classifier.describe(failure),
                None => "Assertion failed".to_string(),
            };
            Ok(OutcomeRecord::failed(assertion, error))
        })
        .collect()
}

/// Build the output document for one execution.
pub fn build_report(
    assertions: &[Assertion],
    executed: Result<ShimReport, HarnessError>,
    classifier: &Classifier<'_>,
) -> Report {
    let judged = executed.and_then(|report| match report {
        ShimReport::Completed { outcomes } => outcome_records(assertions, &outcomes, classifier),
        ShimReport::Failed { failure } => Err(classifier.fatal(&failure)),
    });

    match judged {
        Ok(tests) => Report::Tests { tests },
        Err(err) => {
            tracing::info!(kind = err.kind(), "run ended with a fatal error");
            Report::fatal(err.to_string())
        }
    }
}

/// Write `report` as one JSON line.
pub fn write_report<W: Write>(out: &mut W, report: &Report) -> Result<()> {
    serde_json::to_writer(&mut *out, report).context("Failed to serialize report")?;
    writeln!(out).context("Failed to write report")?;
    out.flush().context("Failed to flush report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Comparison, RawFailure};
    use crate::compose::{compose, ComposedProgram, Identifiers};
    use serde_json::json;
    use std::time::Duration;

    fn assertions() -> Vec<Assertion> {
        vec![
            Assertion {
                id: 10,
                assertion: "assert.equal(inc(1), 2)".into(),
                is_public: true,
            },
            Assertion {
                id: 11,
                assertion: "assert.equal(inc(2), 4)".into(),
                is_public: false,
            },
        ]
    }

    fn program() -> ComposedProgram {
        compose("const inc = n => n + 1", &assertions(), Identifiers::with_suffix("t"))
    }

    fn raw(id: i64, text: &str, failure: Option<RawFailure>) -> RawOutcome {
        RawOutcome {
            id,
            assertion: text.into(),
            public: id == 10,
            passed: failure.is_none(),
            failure,
        }
    }

    fn assertion_failure() -> RawFailure {
        RawFailure {
            message: "AssertionError [ERR_ASSERTION]: 3 == 4".into(),
            stack: None,
            comparison: Some(Comparison {
                expected: Some(json!(4)),
                actual: Some(json!(3)),
            }),
            timed_out: false,
        }
    }

    #[test]
    fn completed_run_yields_one_record_per_assertion() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let report = build_report(
            &assertions(),
            Ok(ShimReport::Completed {
                outcomes: vec![
                    raw(10, "assert.equal(inc(1), 2)", None),
                    raw(11, "assert.equal(inc(2), 4)", Some(assertion_failure())),
                ],
            }),
            &classifier,
        );

        let Report::Tests { tests } = report else {
            panic!("expected tests");
        };
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0], OutcomeRecord::passed(&assertions()[0]));
        assert_eq!(tests[1].id, 11);
        assert!(!tests[1].public);
        assert_eq!(
            tests[1].error.as_deref(),
            Some("AssertionError [ERR_ASSERTION]: 3 == 4 expected value 4, but got 3")
        );
    }

    #[test]
    fn missing_outcomes_are_fatal() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let report = build_report(
            &assertions(),
            Ok(ShimReport::Completed {
                outcomes: vec![raw(10, "assert.equal(inc(1), 2)", None)],
            }),
            &classifier,
        );
        assert!(matches!(report, Report::Error { .. }));
    }

    #[test]
    fn reordered_outcomes_are_fatal() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let err = outcome_records(
            &assertions(),
            &[
                raw(11, "assert.equal(inc(2), 4)", None),
                raw(10, "assert.equal(inc(1), 2)", None),
            ],
            &classifier,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::ChannelCorrupted(_)));
    }

    #[test]
    fn tamper_failure_becomes_error_document() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let report = build_report(
            &assertions(),
            Ok(ShimReport::Failed {
                failure: RawFailure {
                    message: composed.identifiers.tamper_marker.clone(),
                    stack: None,
                    comparison: None,
                    timed_out: false,
                },
            }),
            &classifier,
        );
        assert_eq!(report, Report::fatal(crate::errors::TAMPER_MESSAGE));
    }

    #[test]
    fn host_failure_becomes_error_document() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let report = build_report(
            &assertions(),
            Err(HarnessError::Timeout(Duration::from_millis(1000))),
            &classifier,
        );
        assert_eq!(report, Report::fatal("Execution timed out after 1000 ms"));
    }

    #[test]
    fn writes_single_json_line() {
        let mut buf = Vec::new();
        write_report(&mut buf, &Report::fatal("boom")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"error\":\"boom\"}\n");
    }
}
