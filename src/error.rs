//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime) convert their failure
//! modes into one of the variants defined here. This enables a uniform
//! `Result<T>` alias throughout the crate and ergonomic inter-operation with
//! `anyhow` in the binary, while preserving the line/location detail each
//! diagnostic needs.
//!
//! Reporting is the job of [`Diagnostics`], which writes one line per error
//! to its sink and tracks the two flags that gate the pipeline stages.

use std::io;
use std::io::Write;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
///
/// Static errors render as `[line N]: WHERE: MESSAGE` where `WHERE` is
/// empty, ` at end`, or ` at 'lexeme'`; runtime errors as `[line N]: MESSAGE`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}]: : {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error at an offending token.
    #[error("[line {line}]: {location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static-analysis failure from the resolution pass.
    #[error("[line {line}]: {location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("[line {line}]: {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`. Enables `?` on sink writes.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: Self::location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: Self::location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    fn location(token: &Token) -> String {
        if token.token_type == TokenType::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Diagnostic sink plus the process-level flags gating the pipeline.
///
/// `had_error` covers scan/parse/resolve failures; `had_runtime_error`
/// covers evaluation failures. Both must be cleared between independent
/// runs (REPL lines) via [`Diagnostics::reset`].
#[derive(Debug)]
pub struct Diagnostics<W: Write> {
    sink: W,
    had_error: bool,
    had_runtime_error: bool,
}

impl<W: Write> Diagnostics<W> {
    pub fn new(sink: W) -> Self {
        Diagnostics {
            sink,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Write the diagnostic as a single line and raise the matching flag.
    pub fn report(&mut self, err: &LoxError) {
        info!("Reporting diagnostic: {}", err);

        let _ = writeln!(self.sink, "{}", err);

        match err {
            LoxError::Runtime { .. } | LoxError::Io(_) => self.had_runtime_error = true,
            _ => self.had_error = true,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}
