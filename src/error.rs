//! Error types shared across the session and the script engine.
//!
//! Faults raised by user code are [`ScriptError`]s and are always reported back
//! to the participants; only [`SessionError`] is allowed to abort a session.

use crate::script::lexer::LexingError;
use crate::script::parser::ParsingError;
use std::path::PathBuf;
use thiserror::Error;

/// Faults raised while evaluating an already parsed program.
///
/// Messages follow the familiar interpreter wording so participants can tell at
/// a glance what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    /// Operation applied to a value of the wrong type.
    #[error("{0}")]
    Type(String),
    /// Right type, unacceptable value (e.g. `int('abc')`).
    #[error("{0}")]
    Value(String),
    #[error("{0}")]
    Index(String),
    #[error("{0}")]
    Attribute(String),
    #[error("division by zero")]
    ZeroDivision,
    #[error("integer overflow")]
    Overflow,
    /// A repetition or `range` would allocate an unreasonable amount of memory.
    #[error("result is too large")]
    TooLarge,
    /// Lists nested (or cyclic) deeper than comparison will follow.
    #[error("maximum recursion depth exceeded in comparison")]
    RecursionLimit,
    /// `print` could not write to the session output.
    #[error("cannot write output: {0}")]
    Output(String),
}

impl RuntimeError {
    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        RuntimeError::Type(msg.into())
    }
}

/// Any fault produced by running a piece of script text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Lexing(#[from] LexingError),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Bootstrap script '{}' was not found", path.display())]
    BootstrapMissing { path: PathBuf },
    #[error("Bootstrap script '{}' could not be read", path.display())]
    BootstrapUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Bootstrap script '{}' failed", path.display())]
    BootstrapFailed {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },
}
