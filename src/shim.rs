// src/shim.rs

//! Runtime shim executed by Node.
//!
//! The Rust side never evaluates JavaScript itself. It writes the composed
//! program next to this shim and runs
//! `node <shim> <program> <timeout_ms> <capture> <assert> <AssertionError>`,
//! the last three being the globals the composed program reads its
//! capabilities from.
//!
//! Responsibilities of the shim:
//! - Create a fresh `vm` context exposing only the grading capabilities
//! - Compile the composed program as `submission.js` and run it once, under
//!   the timeout
//! - Freeze the host intrinsics reachable through those capabilities
//! - Capture thrown values as plain data (message, stack, expected/actual)
//!   and flag the runtime's own timeout termination
//! - Emit ONE JSON line to STDOUT at the very end
//!
//! Formatting of failures happens on the Rust side, not here.

/// Filename the composed program is compiled under. Stack frames refer to it.
pub const SCRIPT_NAME: &str = "submission.js";

/// File name the shim is written under inside the staging directory.
pub const SHIM_FILE: &str = "vmgrade_runner.cjs";

/// Node.js shim (CommonJS).
///
/// Usage (internal):
/// node vmgrade_runner.cjs <program.js> <timeoutMs> <captureGlobal> <assertGlobal> <assertionErrorGlobal>
pub fn node_shim() -> &'static str {
    r#"'use strict';
const fs = require('node:fs');
const vm = require('node:vm');
const assert = require('node:assert');

// Host intrinsics the shim relies on, taken before any submitted code runs.
const { freeze, getOwnPropertyDescriptor, hasOwn } = Object;
const { stringify, parse } = JSON;
const objectToString = Object.prototype.toString;
const now = performance.now.bind(performance);
const stdout = process.stdout;

const [, , programPath, timeoutArg, captureGlobal, assertGlobal, assertionErrorGlobal] = process.argv;
const timeout = Number(timeoutArg);

function emit(report) {
  stdout.write(stringify(report) + '\n');
}

// Sandbox promise jobs may reject after evaluation; they must not crash the
// runner before the report is written.
process.on('unhandledRejection', () => {});

// Capabilities handed to the sandbox are host objects, so their prototype
// chains lead back here. Nothing on those chains may change once the
// submitted program starts.
function harden() {
  for (const value of [
    Object, Object.prototype,
    Function, Function.prototype,
    Array, Array.prototype,
    JSON,
    assert, assert.strict,
    assert.AssertionError, assert.AssertionError.prototype,
  ]) {
    freeze(value);
  }
}

// Own data property, without running accessors or consulting prototypes.
function own(target, key) {
  const descriptor = getOwnPropertyDescriptor(target, key);
  return descriptor !== undefined && hasOwn(descriptor, 'value') ? descriptor.value : undefined;
}

function describe(value) {
  try {
    return String(value);
  } catch (_) {
    try {
      return objectToString.call(value);
    } catch (_) {
      return 'Uncaught exception';
    }
  }
}

function readStack(value) {
  try {
    if (value !== null && (typeof value === 'object' || typeof value === 'function')) {
      const stack = value.stack;
      if (typeof stack === 'string') return stack;
    }
  } catch (_) {}
  return undefined;
}

// JSON-portable copy of a value, or undefined when there is none.
function portable(value) {
  if (value === undefined) return undefined;
  try {
    const text = stringify(value);
    return text === undefined ? undefined : parse(text);
  } catch (_) {
    return describe(value);
  }
}

function carriesComparison(value) {
  try {
    return value !== null && typeof value === 'object' && 'expected' in value && 'actual' in value;
  } catch (_) {
    return false;
  }
}

function captureFailure(value) {
  const failure = { message: describe(value) };
  const stack = readStack(value);
  if (stack !== undefined) failure.stack = stack;
  if (carriesComparison(value)) {
    const comparison = {};
    let expected, actual;
    try { expected = portable(value.expected); } catch (_) {}
    try { actual = portable(value.actual); } catch (_) {}
    if (expected !== undefined) comparison.expected = expected;
    if (actual !== undefined) comparison.actual = actual;
    failure.comparison = comparison;
  }
  return failure;
}

// The runtime's own termination: its error code, raised no earlier than the
// budget allows. Text the program throws never qualifies.
function terminatedByTimeout(value, elapsed) {
  if (elapsed < timeout || value === null || typeof value !== 'object') return false;
  try {
    return own(value, 'code') === 'ERR_SCRIPT_EXECUTION_TIMEOUT';
  } catch (_) {
    return false;
  }
}

// Outcome records are read through own data properties only, so accessors
// the submitted program defines on its prototypes take no part.
function copyOutcomes(channel) {
  const outcomes = [];
  const length = Number(own(channel, 'length')) || 0;
  for (let i = 0; i < length; i++) {
    const record = own(channel, String(i));
    if (record === null || typeof record !== 'object') continue;
    const outcome = {
      id: own(record, 'id'),
      assertion: own(record, 'assertion'),
      public: own(record, 'public') === true,
      passed: own(record, 'passed') === true,
    };
    const failure = own(record, 'failure');
    if (!outcome.passed && failure !== undefined) outcome.failure = failure;
    outcomes[outcomes.length] = outcome;
  }
  return outcomes;
}

let source;
try {
  source = fs.readFileSync(programPath, 'utf8');
} catch (e) {
  emit({ status: 'failed', failure: captureFailure(e) });
  process.exit(0);
}

const sandbox = { assert, AssertionError: assert.AssertionError };
sandbox[captureGlobal] = captureFailure;
sandbox[assertGlobal] = assert;
sandbox[assertionErrorGlobal] = assert.AssertionError;

const context = vm.createContext(sandbox, {
  name: 'vmgrade',
  codeGeneration: { strings: false, wasm: false },
  microtaskMode: 'afterEvaluate',
});

harden();

let report;
const started = now();
try {
  const script = new vm.Script(source, { filename: 'submission.js' });
  const channel = script.runInContext(context, { timeout, displayErrors: false });
  report = { status: 'completed', outcomes: copyOutcomes(channel) };
} catch (e) {
  const elapsed = now() - started;
  const failure = captureFailure(e);
  if (terminatedByTimeout(e, elapsed)) failure.timedOut = true;
  report = { status: 'failed', failure };
}

emit(report);
"#
}
