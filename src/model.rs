// src/model.rs

//! Grading data model.
//!
//! - `Assertion`: one grader-authored expression, as supplied by the caller
//! - `OutcomeRecord`: the verdict for one assertion
//! - `Report`: the single document written to stdout per invocation

use serde::{Deserialize, Serialize};

/// A single assertion supplied by the grading service.
///
/// Extra fields in the input are ignored; the three below are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Assertion {
    pub id: i64,

    /// Expression text, evaluated verbatim after the submitted program.
    pub assertion: String,

    /// Whether the grading service may show this assertion to the learner.
    pub is_public: bool,
}

/// Verdict for one assertion, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub id: i64,
    pub assertion: String,
    pub public: bool,
    pub passed: bool,

    /// Present only when `passed` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    pub fn passed(assertion: &Assertion) -> Self {
        Self {
            id: assertion.id,
            assertion: assertion.assertion.clone(),
            public: assertion.is_public,
            passed: true,
            error: None,
        }
    }

    pub fn failed(assertion: &Assertion, error: impl Into<String>) -> Self {
        Self {
            id: assertion.id,
            assertion: assertion.assertion.clone(),
            public: assertion.is_public,
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// The output document. Exactly one top-level key is ever serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Tests { tests: Vec<OutcomeRecord> },
    Error { error: String },
}

impl Report {
    pub fn fatal(message: impl Into<String>) -> Self {
        Report::Error {
            error: message.into(),
        }
    }
}
