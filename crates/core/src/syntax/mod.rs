//! Front end for the config source language
//!
//! Config files are written in a small JavaScript-like scripting language
//! (typed syntax accepted, not required). This module provides the lexer,
//! the AST, a recursive-descent parser, and a printer that re-serializes
//! syntax trees back to source text.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use parser::parse_module;
pub use printer::{print_module, print_module_retain_lines};

/// Byte range of a node within the source text it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Slice the original source text covered by this span.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// A lexing or parsing failure, with the 1-based source line it occurred on.
#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}
