//! Error types for solver invocation and result reading.

use crate::SolverKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a solver or reading its output.
///
/// A well-formed but non-optimal result is not an error; it comes back as a
/// normal [`SolverOutcome`](crate::outcome::SolverOutcome) with no solution
/// payload.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Solver executable not found in `~/.lpio/solvers` or on `$PATH`.
    #[error("solver {kind} is not installed")]
    NotInstalled { kind: SolverKind },

    /// The solver process could not be started.
    #[error("failed to start solver process: {0}")]
    ProcessStart(#[source] std::io::Error),

    /// The expected solution file is absent or unreadable. A crashed or
    /// missing solver run manifests here as well.
    #[error("solution file {} is missing or unreadable: {source}", .path.display())]
    MissingSolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The solution file exists but does not match the solver's dialect.
    #[error("malformed solution file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// An in-process solver model reported a failure.
    #[error("solver model error: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results of solver operations.
pub type SolveResult<T> = Result<T, SolveError>;
