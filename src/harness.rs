// src/harness.rs

//! Assertion harness generator.
//!
//! Turns the assertion list into guarded evaluation units: one JavaScript
//! block per assertion that evaluates the expression, records the verdict and
//! appends it to the output channel. A throw inside one unit is caught by that
//! unit and never reaches the next one.

use serde_json::Value;

use crate::compose::Identifiers;
use crate::model::Assertion;

/// Embed `text` as a JavaScript string literal.
///
/// JSON string syntax is a subset of JavaScript's, so the text round-trips
/// byte for byte without template interpolation (`${`) or backtick issues.
pub fn string_literal(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}

/// Build the guarded unit for one assertion.
///
/// The verdict lives in a local until evaluation ends. The record is then
/// created as a prototype-less literal and defined onto the channel, so
/// accessors the program installs on `Object.prototype` or
/// `Array.prototype` never see or rewrite it.
pub fn guarded_unit(assertion: &Assertion, ids: &Identifiers) -> String {
    let Identifiers {
        channel,
        define,
        verdict,
        failure,
        caught,
        assert,
        assertion_error,
        capture,
        ..
    } = ids;

    // The expression sits on its own lines so a trailing `//` comment in it
    // cannot swallow harness code.
    format!(
        "{{\n\
         const assert = {assert}, AssertionError = {assertion_error};\n\
         let {verdict} = false, {failure};\n\
         try {{\n\
         {expression}\n\
         ;{verdict} = true;\n\
         }} catch ({caught}) {{\n\
         {failure} = {capture}({caught});\n\
         }}\n\
         {define}({channel}, {channel}.length, {{ __proto__: null, value: \
         {{ __proto__: null, id: {id}, assertion: {text}, public: {public}, passed: {verdict}, failure: {failure} }}, \
         writable: true, enumerable: true, configurable: true }});\n\
         }}\n",
        id = assertion.id,
        text = string_literal(&assertion.assertion),
        public = assertion.is_public,
        expression = assertion.assertion,
    )
}

/// Concatenate the guarded units for every assertion, in input order.
pub fn guarded_units(assertions: &[Assertion], ids: &Identifiers) -> String {
    assertions
        .iter()
        .map(|a| guarded_unit(a, ids))
        .collect()
}
