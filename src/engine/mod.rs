// src/engine/mod.rs

//! Isolation execution engine.
//!
//! A `Sandbox` runs one composed program exactly once and returns the
//! runtime's report. There are no retries.

use std::future::Future;

use crate::compose::ComposedProgram;
use crate::errors::HarnessError;

pub mod node;
pub mod protocol;

pub use node::NodeSandbox;
pub use protocol::{RawOutcome, ShimReport};

pub trait Sandbox {
    /// Execute `program`. Runtime-level throws come back as
    /// `ShimReport::Failed`; host-level failures (launch, hard deadline,
    /// crash) as `Err`.
    fn execute(
        &self,
        program: &ComposedProgram,
    ) -> impl Future<Output = Result<ShimReport, HarnessError>>;
}
