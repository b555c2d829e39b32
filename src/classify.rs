// src/classify.rs

//! Error classifier and formatter.
//!
//! Raw failures arrive from the runtime as plain data (message, stack and an
//! optional expected/actual comparison). They are turned into learner-facing
//! text along two paths:
//!
//! - assertion path: the failure carries `expected` and `actual`
//! - generic path: everything else, with line numbers mapped back onto the
//!   submitted program
//!
//! Nothing here performs I/O or panics.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::compose::ComposedProgram;
use crate::errors::HarnessError;

// Matches `submission.js:12` and `submission.js:12:5`.
static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"submission\.js:(\d+)(?::(\d+))?").expect("valid location pattern")
});

/// A thrown value, as captured inside the runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFailure {
    /// String form of the thrown value.
    pub message: String,

    #[serde(default)]
    pub stack: Option<String>,

    /// Present when the thrown value carries both `expected` and `actual`.
    #[serde(default)]
    pub comparison: Option<Comparison>,

    /// Set by the runtime only when it terminated the script for exceeding
    /// its time budget. Thrown text alone never marks a timeout.
    #[serde(default, rename = "timedOut")]
    pub timed_out: bool,
}

/// Expected/actual pair. A missing side stands for `undefined`; JSON `null`
/// stays `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comparison {
    #[serde(default, deserialize_with = "present")]
    pub expected: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub actual: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Failure shape, decided by capability rather than by type.
#[derive(Debug, PartialEq)]
pub enum Failure<'a> {
    Assertion {
        headline: &'a str,
        expected: Option<&'a Value>,
        actual: Option<&'a Value>,
    },
    Generic {
        headline: &'a str,
        stack: Option<&'a str>,
    },
}

impl RawFailure {
    /// First line of the thrown value's message.
    pub fn headline(&self) -> &str {
        let first = self.message.lines().next().unwrap_or("").trim_end();
        if first.is_empty() {
            "Uncaught exception"
        } else {
            first
        }
    }

    pub fn shape(&self) -> Failure<'_> {
        match &self.comparison {
            Some(c) => Failure::Assertion {
                headline: self.headline(),
                expected: c.expected.as_ref(),
                actual: c.actual.as_ref(),
            },
            None => Failure::Generic {
                headline: self.headline(),
                stack: self.stack.as_deref(),
            },
        }
    }

}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "undefined".to_string(),
    }
}

/// `<first line> expected value <expected>, but got <actual>`
pub fn format_assertion(headline: &str, expected: Option<&Value>, actual: Option<&Value>) -> String {
    format!(
        "{headline} expected value {}, but got {}",
        render(expected),
        render(actual)
    )
}

/// Formats failures for one composed program.
pub struct Classifier<'a> {
    program: &'a ComposedProgram,
    timeout: Duration,
}

impl<'a> Classifier<'a> {
    pub fn new(program: &'a ComposedProgram, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Generic path: timeout message, or the headline with the position
    /// mapped onto the submitted program.
    pub fn format_generic(&self, failure: &RawFailure) -> String {
        if failure.timed_out {
            return HarnessError::Timeout(self.timeout).to_string();
        }

        let headline = failure.headline();
        match self.locate(failure) {
            Some((line, Some(column))) => format!("{headline} on line {line}, at position {column}"),
            Some((line, None)) => format!("{headline} on line {line}"),
            None => headline.to_string(),
        }
    }

    /// Error text for a failed assertion.
    pub fn describe(&self, failure: &RawFailure) -> String {
        match failure.shape() {
            Failure::Assertion {
                headline,
                expected,
                actual,
            } => format_assertion(headline, expected, actual),
            Failure::Generic { .. } => self.format_generic(failure),
        }
    }

    /// Classify a failure that escaped every guarded unit.
    pub fn fatal(&self, failure: &RawFailure) -> HarnessError {
        if failure.message == self.program.identifiers.tamper_marker {
            HarnessError::Tamper
        } else if failure.timed_out {
            HarnessError::Timeout(self.timeout)
        } else {
            HarnessError::Runtime(self.format_generic(failure))
        }
    }

    /// Innermost reported position, if it lies inside the submitted program.
    fn locate(&self, failure: &RawFailure) -> Option<(usize, Option<usize>)> {
        let stack = failure.stack.as_deref()?;
        // Runtime errors repeat the message at the top of the stack; the
        // message itself may mention a location.
        let frames = stack.strip_prefix(failure.message.as_str()).unwrap_or(stack);

        let caps = LOCATION.captures(frames)?;
        let script_line: usize = caps.get(1)?.as_str().parse().ok()?;
        let line = self.program.program_line(script_line)?;
        let column = caps.get(2).and_then(|c| c.as_str().parse().ok());
        Some((line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose, Identifiers};
    use rstest::rstest;
    use serde_json::json;

    fn program() -> ComposedProgram {
        compose("let a = 1\nlet b = 2\nfoo()", &[], Identifiers::with_suffix("t"))
    }

    fn generic(message: &str, stack: Option<String>) -> RawFailure {
        RawFailure {
            message: message.to_string(),
            stack,
            comparison: None,
            timed_out: false,
        }
    }

    #[test]
    fn timeout_discards_detail() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let failure: RawFailure = serde_json::from_value(json!({
            "message": "Error: Script execution timed out after 1000ms",
            "stack": "Error: Script execution timed out after 1000ms\n    at submission.js:3:1",
            "timedOut": true
        }))
        .unwrap();
        assert_eq!(classifier.format_generic(&failure), "Execution timed out after 1000 ms");
        assert!(matches!(classifier.fatal(&failure), HarnessError::Timeout(_)));
    }

    #[test]
    fn thrown_timeout_text_is_an_ordinary_runtime_error() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let script_line = composed.preamble_lines + 3;
        let failure = generic(
            "Error: execution timed out",
            Some(format!("Error: execution timed out\n    at submission.js:{script_line}:7")),
        );
        assert_eq!(
            classifier.fatal(&failure).to_string(),
            "Error: execution timed out on line 3, at position 7"
        );
    }

    #[test]
    fn runtime_error_line_is_relative_to_submission() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let script_line = composed.preamble_lines + 3;
        let failure = generic(
            "ReferenceError: foo is not defined",
            Some(format!(
                "ReferenceError: foo is not defined\n    at submission.js:{script_line}:1\n    at Script.runInContext (node:vm:149:12)"
            )),
        );
        assert_eq!(
            classifier.format_generic(&failure),
            "ReferenceError: foo is not defined on line 3, at position 1"
        );
        assert_eq!(
            classifier.fatal(&failure).to_string(),
            "ReferenceError: foo is not defined on line 3, at position 1"
        );
    }

    #[test]
    fn syntax_error_header_has_no_column() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let script_line = composed.preamble_lines + 2;
        let failure = generic(
            "SyntaxError: Unexpected identifier 'b'",
            Some(format!(
                "submission.js:{script_line}\nlet b b = 2\n      ^\n\nSyntaxError: Unexpected identifier 'b'\n    at new Script (node:vm:117:7)"
            )),
        );
        assert_eq!(
            classifier.format_generic(&failure),
            "SyntaxError: Unexpected identifier 'b' on line 2"
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some("TypeError: x is not a function\n    at submission.js:40:3".to_string()))]
    #[case(Some("Error: thrown from node:internal\n    at node:vm:1:1".to_string()))]
    fn positions_outside_submission_are_dropped(#[case] stack: Option<String>) {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let failure = generic("TypeError: x is not a function", stack);
        assert_eq!(classifier.format_generic(&failure), "TypeError: x is not a function");
    }

    #[test]
    fn tamper_marker_is_recognised() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let failure = generic(&composed.identifiers.tamper_marker, None);
        assert!(matches!(classifier.fatal(&failure), HarnessError::Tamper));
    }

    #[test]
    fn forged_tamper_text_without_marker_is_a_runtime_error() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let failure = generic("vmgrade:tamper:guess", None);
        assert!(matches!(classifier.fatal(&failure), HarnessError::Runtime(_)));
    }

    #[test]
    fn assertion_failure_renders_expected_and_actual() {
        let composed = program();
        let classifier = Classifier::new(&composed, Duration::from_millis(1000));
        let failure = RawFailure {
            message: "AssertionError [ERR_ASSERTION]: Expected values to be strictly equal:\n\n3 !== 4\n".into(),
            stack: Some("AssertionError [ERR_ASSERTION]: Expected values to be strictly equal:".into()),
            comparison: Some(Comparison {
                expected: Some(json!(4)),
                actual: Some(json!(3)),
            }),
            timed_out: false,
        };
        assert_eq!(
            classifier.describe(&failure),
            "AssertionError [ERR_ASSERTION]: Expected values to be strictly equal: expected value 4, but got 3"
        );
    }

    #[rstest]
    #[case(Some(json!({"b": 1, "a": [1, "x"]})), r#"{"b":1,"a":[1,"x"]}"#)]
    #[case(Some(json!("text")), r#""text""#)]
    #[case(Some(Value::Null), "null")]
    #[case(None, "undefined")]
    fn comparison_sides_render_structurally(#[case] value: Option<Value>, #[case] expected: &str) {
        let text = format_assertion("AssertionError", value.as_ref(), Some(&json!(0)));
        assert_eq!(text, format!("AssertionError expected value {expected}, but got 0"));
    }

    #[test]
    fn shape_is_decided_by_comparison_presence() {
        let with: RawFailure = serde_json::from_value(json!({
            "message": "Custom: nope",
            "comparison": { "expected": null }
        }))
        .unwrap();
        assert_eq!(
            with.shape(),
            Failure::Assertion {
                headline: "Custom: nope",
                expected: Some(&Value::Null),
                actual: None,
            }
        );

        let without: RawFailure = serde_json::from_value(json!({ "message": "oops" })).unwrap();
        assert!(matches!(without.shape(), Failure::Generic { headline: "oops", stack: None }));
    }

    #[test]
    fn empty_message_gets_placeholder_headline() {
        assert_eq!(generic("", None).headline(), "Uncaught exception");
    }
}
