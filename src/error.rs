//! Error types for every stage of the interpreter.
//!
//! [`LoxError`] is one diagnostic.  Its `Display` is exactly the text a user
//! sees: `[line N] Error<where>: message` for problems found before execution,
//! `message\n[line N]` for runtime failures.  [`RunError`] is what a whole run
//! of a program ends with.  Nothing here prints; callers decide where
//! diagnostics go.

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Bad character or unterminated string.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'lexeme'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// A rule broken without running anything, found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, tagged with the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Writing `print` output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Points at `token`, which supplies the line and location.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: token.location(),
            line: token.line,
        }
    }

    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: token.location(),
            line: token.line,
        }
    }

    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// The bare message without the line decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// `true` for errors that gate execution of a whole submitted program.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LoxError>;

/// Why a submitted program did not run to completion.
#[derive(Debug, Error)]
pub enum RunError {
    /// One or more lexical, syntax or static errors; nothing was executed.
    #[error("{}", DisplayAll(.0))]
    Static(Vec<LoxError>),

    /// Execution started and was abandoned at the first runtime error.
    #[error(transparent)]
    Runtime(LoxError),
}

impl RunError {
    /// Process exit status conventionally associated with the failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// Every diagnostic carried by this failure, in report order.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            RunError::Static(errors) => errors.iter().collect(),
            RunError::Runtime(error) => vec![error],
        }
    }
}

struct DisplayAll<'e>(&'e [LoxError]);

impl fmt::Display for DisplayAll<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}
