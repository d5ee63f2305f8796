use std::io::Write;

use log::info;

use crate::error::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Front door for the language pipeline: one source unit in, program output
/// and diagnostics out through the two sinks.
///
/// The interpreter (and with it the global environment and the resolution
/// table) persists across `run` calls, so REPL lines build on each other.
pub struct Lox<O: Write, E: Write> {
    interpreter: Interpreter<O>,
    diagnostics: Diagnostics<E>,
}

impl<O: Write, E: Write> Lox<O, E> {
    pub fn new(output: O, errors: E) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            diagnostics: Diagnostics::new(errors),
        }
    }

    /// Run source through scan → parse → resolve → interpret. Each stage is
    /// skipped once an earlier stage has reported; a runtime error can only
    /// arise in the final stage.
    pub fn run(&mut self, source: &str) {
        info!("Running {} bytes of source", source.len());

        let mut tokens: Vec<Token> = Vec::new();
        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(err) => self.diagnostics.report(&err),
            }
        }
        if self.diagnostics.had_error() {
            return;
        }

        let (statements, errors) = Parser::new(tokens).parse();
        for err in &errors {
            self.diagnostics.report(err);
        }
        if self.diagnostics.had_error() {
            return;
        }

        let errors = Resolver::new(&mut self.interpreter).resolve(&statements);
        for err in &errors {
            self.diagnostics.report(err);
        }
        if self.diagnostics.had_error() {
            return;
        }

        if let Err(err) = self.interpreter.interpret(&statements) {
            self.diagnostics.report(&err);
        }
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.diagnostics.had_runtime_error()
    }

    /// Clear both error flags. Definitions survive; a REPL line after a bad
    /// one starts from a clean slate.
    pub fn reset(&mut self) {
        self.diagnostics.reset();
    }

    pub fn into_sinks(self) -> (O, E) {
        (
            self.interpreter.into_output(),
            self.diagnostics.into_sink(),
        )
    }
}
