//! One interpreter session: every call to [`Lox::run`] pushes a unit of
//! source through scan → parse → resolve → interpret. Globals and resolved
//! bindings persist between calls, which is what a REPL needs.

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::{Config, Interpreter};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// How a single run ended.
#[derive(Debug)]
pub enum Outcome {
    Success,
    /// Lexing, syntax or resolution errors; nothing was executed.
    StaticErrors(Vec<LoxError>),
    /// Execution started and stopped at this error.
    RuntimeError(LoxError),
}

impl Outcome {
    /// Conventional sysexits codes: 65 for bad input, 70 for a runtime failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticErrors(_) => 65,
            Outcome::RuntimeError(_) => 70,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Every diagnostic produced by the run, in report order.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            Outcome::Success => Vec::new(),
            Outcome::StaticErrors(errors) => errors.iter().collect(),
            Outcome::RuntimeError(error) => vec![error],
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn run(&mut self, source: &str, config: Config) -> Outcome {
        info!("Running {} bytes of source", source.len());

        let (tokens, mut errors) = Scanner::scan_all(source);

        let (statements, parse_errors) = Parser::new(tokens).parse();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            debug!("Stopping before resolution: {} error(s)", errors.len());
            return Outcome::StaticErrors(errors);
        }

        let locals = match Resolver::new().resolve(&statements) {
            Ok(locals) => locals,
            Err(errors) => {
                debug!("Stopping before execution: {} error(s)", errors.len());
                return Outcome::StaticErrors(errors);
            }
        };

        self.interpreter.note_locals(locals);

        match self.interpreter.interpret(&statements, config) {
            Ok(()) => Outcome::Success,
            Err(error) => Outcome::RuntimeError(error),
        }
    }
}
