//! The backend trait and options shared by every solver dialect.

use crate::error::{SolveError, SolveResult};
use crate::outcome::SolverOutcome;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// One LP solver, invoked backend-agnostically.
///
/// Implementations shell out to an external executable and parse its
/// solution file, or drive an in-process model object; either way the
/// caller gets the same normalized [`SolverOutcome`]. The call blocks until
/// the solver finishes; no timeout is applied here, so callers wanting one
/// must wrap the invocation externally.
pub trait SolverBackend {
    fn solve(&self, problem: &Path, opts: &SolveOptions) -> SolveResult<SolverOutcome>;
}

/// Options for one solve, shared across dialects.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Where the solver writes its solution. Derived from the problem path
    /// (`.sol` extension) when not given.
    pub solution_path: Option<PathBuf>,
    /// Solver log destination; solver output is inherited when absent.
    pub log_path: Option<PathBuf>,
    /// Free-text option fragments appended verbatim to the solver command
    /// line. In-process backends interpret each fragment as `key=value`.
    pub options: Vec<String>,
    /// Keep the problem and solution files after a successful parse.
    pub keep_files: bool,
    /// Warm-start basis to feed the solver.
    pub warmstart: Option<PathBuf>,
    /// Persist the solver's basis next to the solution file.
    pub store_basis: bool,
}

impl SolveOptions {
    /// Resolve the solution path for the given problem file.
    pub fn solution_path_for(&self, problem: &Path) -> PathBuf {
        self.solution_path
            .clone()
            .unwrap_or_else(|| problem.with_extension("sol"))
    }
}

/// Basis path derived from a solution path by swapping the `.sol` suffix
/// for `.bas`.
pub fn basis_path(solution: &Path) -> PathBuf {
    solution.with_extension("bas")
}

/// Run a solver command to completion, capturing its output into the log
/// file when one is given.
///
/// A nonzero exit is logged but not fatal here: a failed run leaves no
/// usable solution file, and the dialect parser reports that as the error
/// the caller sees.
pub(crate) fn run_command(mut cmd: Command, log_path: Option<&Path>) -> SolveResult<()> {
    debug!("running solver: {:?}", cmd);
    let status = match log_path {
        Some(log) => {
            let output = cmd
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(SolveError::ProcessStart)?;
            let mut file = std::fs::File::create(log)?;
            file.write_all(&output.stdout)?;
            file.write_all(&output.stderr)?;
            output.status
        }
        None => cmd.status().map_err(SolveError::ProcessStart)?,
    };
    if !status.success() {
        warn!("solver exited with {status}");
    }
    Ok(())
}

/// Best-effort removal of intermediate files; failures are logged, never
/// fatal.
pub(crate) fn remove_files<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
    }
}
