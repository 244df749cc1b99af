//! Plow Core Library
//!
//! This is the core library for the Plow task runner. A config source file
//! declares named tasks made of named runs; this crate turns such a file
//! into executed shell commands without ever importing the file as a
//! module.
//!
//! ## Architecture
//!
//! The pipeline is a chain of independent stages:
//!
//! - [`discovery`] - Config file location by filename suffix
//! - [`extract`] - Static extraction of options, imports, and tasks from source
//! - [`select`] - Resolution of which extracted tasks to run
//! - [`synth`] - Synthesis of a minimal standalone program from the selection
//! - [`lower`] - Portability transform down to a widely runnable baseline
//! - [`sandbox`] - Isolated execution with only the runner primitives bound
//! - [`syntax`] - The shared front end (lexer, parser, AST, printer)
//! - [`config`] - The extracted top-level options
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! ```rust,no_run
//! use plow_core::sandbox::{run_program, ShellRunner};
//!
//! # fn example(source: &str) -> plow_core::types::PlowResult<()> {
//! let extracted = plow_core::extract::extract(source);
//! let program = plow_core::synth::synthesize(&extracted.options, &extracted.tasks);
//! let final_text = plow_core::lower::lower(&program)?;
//! let totals = run_program(&final_text, &ShellRunner)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod extract;
pub mod lower;
pub mod sandbox;
pub mod select;
pub mod synth;
pub mod syntax;
pub mod types;

// Re-export the main types for easier usage
pub use types::{PlowError, PlowResult};
