//! Sandbox Executor
//!
//! Runs final program text inside an isolated evaluation context whose
//! only pre-populated bindings are the four runner primitives (`task`,
//! `command`, `commandLive`, `runs`). The program is compiled once and
//! executed synchronously to completion; any evaluation error is caught
//! at this boundary and surfaced as [`PlowError::Sandbox`] instead of
//! crashing the host. Whether that terminates the process is the
//! caller's decision.

pub mod interp;
pub mod process;
pub mod runtime;
pub mod value;

pub use process::{CapturedOutput, ProcessRunner, ShellRunner};
pub use runtime::{RunFailure, RunTotals};

use crate::syntax::parse_module;
use crate::types::{PlowError, PlowResult};
use interp::Interpreter;

/// Execute final source text in the isolated context, returning aggregate
/// pass/fail counts across its tasks.
pub fn run_program(source: &str, runner: &dyn ProcessRunner) -> PlowResult<RunTotals> {
    let module = parse_module(source)
        .map_err(|e| PlowError::Sandbox(format!("cannot compile program: {}", e)))?;
    let mut interp = Interpreter::new(source, runner);
    interp
        .run(&module)
        .map_err(|e| PlowError::Sandbox(e.to_string()))
}
