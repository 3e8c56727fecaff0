//! A run session: the full scan → parse → resolve → interpret pipeline over
//! one long-lived interpreter.
//!
//! Error state is carried in each call's return value instead of process-wide
//! flags, so one session can serve every line of an interactive prompt while
//! the global environment persists between them.

use std::io::Write;

use log::{debug, info};

use crate::error::RunError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// Session whose `print` output goes to `out`.
    pub fn with_output<W: Write + 'static>(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Run one submitted program.
    ///
    /// Lexical and syntax errors are all reported together; if there are none
    /// the program is resolved, and any static error suppresses execution
    /// entirely.  A runtime error abandons the rest of this program only.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} bytes of source", source.len());

        let (tokens, mut errors) = Scanner::new(source).scan_all();
        debug!("Scanned {} tokens, {} lexical error(s)", tokens.len(), errors.len());

        let (statements, parse_errors) = Parser::new(tokens).parse();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            return Err(RunError::Static(errors));
        }

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }
}
