// src/compose.rs

//! Program composer.
//!
//! Builds the single script the runtime executes:
//!
//! 1. preamble: output channel + preserved built-ins and capabilities
//! 2. the submitted program, verbatim
//! 3. restoration of the preserved built-ins
//! 4. tamper check on the output channel
//! 5. channel reset
//! 6. guarded evaluation units, one per assertion
//! 7. the channel as the script's completion value
//!
//! The composer also records how many lines precede the submitted program so
//! the classifier can map runtime positions back to the learner's text.

use std::collections::HashSet;

use uuid::Uuid;

use crate::errors::HarnessError;
use crate::harness::{guarded_units, string_literal};
use crate::model::Assertion;

/// Script-level identifiers used by the harness.
///
/// All of them share a per-invocation suffix so the submitted program cannot
/// refer to them by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    pub suffix: String,
    pub channel: String,
    pub array: String,
    pub push: String,
    pub shift: String,
    pub is_extensible: String,
    pub describe: String,
    pub define: String,
    pub assert: String,
    pub assertion_error: String,
    pub capture: String,
    /// Per-unit locals holding the verdict and the captured failure until
    /// the record is built.
    pub verdict: String,
    pub failure: String,
    pub caught: String,
    /// Globals under which the runtime publishes the grading capabilities.
    /// Hoisted declarations in the submitted program cannot shadow them
    /// without knowing the suffix.
    pub capture_global: String,
    pub assert_global: String,
    pub assertion_error_global: String,
    /// Value thrown by the tamper check.
    pub tamper_marker: String,
}

impl Identifiers {
    /// Fresh identifiers with a random suffix.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self::with_suffix(&simple[..12])
    }

    /// Identifiers with a fixed suffix. `suffix` must be ASCII alphanumeric
    /// or `_`.
    pub fn with_suffix(suffix: &str) -> Self {
        let name = |stem: &str| format!("__vmgrade_{stem}_{suffix}");
        Self {
            suffix: suffix.to_string(),
            channel: name("out"),
            array: name("Array"),
            push: name("push"),
            shift: name("shift"),
            is_extensible: name("isExtensible"),
            describe: name("describe"),
            define: name("define"),
            assert: name("assert"),
            assertion_error: name("AssertionError"),
            capture: name("capture"),
            verdict: name("ok"),
            failure: name("failure"),
            caught: name("e"),
            capture_global: name("captureFailure"),
            assert_global: name("assertModule"),
            assertion_error_global: name("AssertionErrorClass"),
            tamper_marker: format!("vmgrade:tamper:{suffix}"),
        }
    }
}

/// The composed script plus the bookkeeping needed to interpret failures.
#[derive(Debug, Clone)]
pub struct ComposedProgram {
    pub source: String,
    pub identifiers: Identifiers,
    /// Lines emitted before the first line of the submitted program.
    pub preamble_lines: usize,
    /// Number of lines in the submitted program.
    pub program_lines: usize,
}

impl ComposedProgram {
    /// Map a 1-based line of the composed script to a 1-based line of the
    /// submitted program, if it falls inside it.
    pub fn program_line(&self, script_line: usize) -> Option<usize> {
        let line = script_line.checked_sub(self.preamble_lines)?;
        (1..=self.program_lines).contains(&line).then_some(line)
    }
}

/// Decode and validate the assertion list supplied by the caller.
pub fn parse_assertions(raw: &str) -> Result<Vec<Assertion>, HarnessError> {
    let assertions: Vec<Assertion> =
        serde_json::from_str(raw).map_err(|e| HarnessError::Composition(e.to_string()))?;

    let mut seen = HashSet::with_capacity(assertions.len());
    for a in &assertions {
        if !seen.insert(a.id) {
            return Err(HarnessError::Composition(format!("duplicate id {}", a.id)));
        }
    }

    Ok(assertions)
}

fn preamble(ids: &Identifiers) -> String {
    let Identifiers {
        channel,
        array,
        push,
        shift,
        is_extensible,
        describe,
        define,
        assert,
        assertion_error,
        capture,
        capture_global,
        assert_global,
        assertion_error_global,
        ..
    } = ids;

    // Intrinsics are reached through literals: top-level function
    // declarations in the submitted program are hoisted above this line and
    // may already shadow `Array` or `Object`.
    format!(
        "const {channel} = []; const {array} = {channel}.constructor; \
         const {push} = {channel}.push; const {shift} = {channel}.shift; \
         const {is_extensible} = ({{}}).constructor.isExtensible; \
         const {describe} = ({{}}).constructor.getOwnPropertyDescriptor; \
         const {define} = ({{}}).constructor.defineProperty; \
         const {assert} = {assert_global}; \
         const {assertion_error} = {assertion_error_global}; \
         const {capture} = {capture_global};\n"
    )
}

fn epilogue(ids: &Identifiers) -> String {
    let Identifiers {
        channel,
        array,
        push,
        shift,
        is_extensible,
        describe,
        tamper_marker,
        ..
    } = ids;
    let marker = string_literal(tamper_marker);

    format!(
        "\n// submitted program ends here\n\
         Array = {array};\n\
         {array}.prototype.push = {push};\n\
         {array}.prototype.shift = {shift};\n\
         if (!{is_extensible}({channel}) || !{describe}({channel}, \"length\").writable) {{\n\
         throw {marker};\n\
         }}\n\
         {channel}.length = 0;\n"
    )
}

/// Assemble the executable script.
pub fn compose(program: &str, assertions: &[Assertion], ids: Identifiers) -> ComposedProgram {
    let head = preamble(&ids);
    let preamble_lines = head.matches('\n').count();

    let mut source = head;
    source.push_str(program);
    source.push_str(&epilogue(&ids));
    source.push_str(&guarded_units(assertions, &ids));
    source.push_str(&ids.channel);
    source.push('\n');

    ComposedProgram {
        source,
        identifiers: ids,
        preamble_lines,
        program_lines: program.lines().count(),
    }
}
