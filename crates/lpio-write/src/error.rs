//! Error types for problem writing.

use crate::token::TokenKind;
use thiserror::Error;

/// Errors that can occur while building and writing an LP problem file.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Two labeled operands disagree on a shared axis.
    ///
    /// Alignment is checked by position and value, never silently coerced:
    /// downstream writers assume the labels of every operand line up.
    #[error("axis labels are not aligned: [{left}] vs [{right}]")]
    ShapeMismatch { left: String, right: String },

    /// A labeled operand's value count does not match its axis lengths.
    #[error("operand has {values} values but its axes describe {expected}")]
    LengthMismatch { values: usize, expected: usize },

    /// A sense string other than `<=`, `=`, `==` or `>=`.
    #[error("not a constraint sense: {0:?}")]
    BadSense(String),

    /// Lookup of a reference that was never registered.
    ///
    /// This is a programming error on the caller's side, not a recoverable
    /// condition.
    #[error("no {kind} reference registered for ({entity}, {attr})")]
    UnknownRef {
        kind: TokenKind,
        entity: String,
        attr: String,
    },

    /// Write failure on a bounds or constraints sink. Fatal for the session;
    /// previously flushed declarations are not rolled back.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results of writing operations.
pub type WriteResult<T> = Result<T, WriteError>;
