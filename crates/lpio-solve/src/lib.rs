//! LP solver backends and normalized result reading.
//!
//! Problems written by `lpio-write` are handed to an external solver and
//! the answer comes back as one normalized [`SolverOutcome`], whatever
//! output convention the solver uses:
//!
//! | Dialect | Reader | Layout |
//! |---------|--------|--------|
//! | CBC     | [`cbc::parse_solution`]  | status header + whitespace rows |
//! | GLPK    | [`glpk::parse_solution`] | colon header + fixed-width tables |
//! | in-process | [`ModelBackend`]      | model object, no text at all |
//!
//! Every backend implements [`SolverBackend`], so callers stay
//! backend-agnostic. A non-optimal termination is a normal outcome with no
//! solution payload, never an error; parse failures and missing files are
//! errors.
//!
//! Solving blocks the calling thread until the solver exits. There is no
//! timeout or cancellation here; wrap the call externally when a hung
//! solver must not block forever.

pub mod backend;
pub mod cbc;
pub mod error;
pub mod glpk;
pub mod model;
pub mod outcome;

pub use backend::{basis_path, SolveOptions, SolverBackend};
pub use cbc::CbcBackend;
pub use error::{SolveError, SolveResult};
pub use glpk::GlpkBackend;
pub use model::{ModelBackend, SolverModel};
pub use outcome::{Solution, SolverOutcome, TerminationCondition};

use std::path::PathBuf;

/// External solver executables with a file-based dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// COIN-OR branch and cut, used here as an LP solver.
    Cbc,
    /// GNU Linear Programming Kit.
    Glpk,
}

impl SolverKind {
    /// Executable name of this solver.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Cbc => "cbc",
            SolverKind::Glpk => "glpsol",
        }
    }

    /// Display name of this solver.
    pub fn display_name(&self) -> &'static str {
        match self {
            SolverKind::Cbc => "CBC",
            SolverKind::Glpk => "GLPK",
        }
    }

    pub fn all() -> &'static [SolverKind] {
        &[SolverKind::Cbc, SolverKind::Glpk]
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for SolverKind {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cbc" => Ok(SolverKind::Cbc),
            "glpk" | "glpsol" => Ok(SolverKind::Glpk),
            _ => Err(SolveError::Parse {
                path: PathBuf::new(),
                message: format!("unknown solver {s:?}"),
            }),
        }
    }
}

/// Find a solver executable.
///
/// Search order:
/// 1. `~/.lpio/solvers/<binary_name>`
/// 2. System `$PATH`
pub fn find_binary(kind: SolverKind) -> SolveResult<PathBuf> {
    let binary_name = kind.binary_name();

    if let Some(home) = dirs::home_dir() {
        let local = home.join(".lpio").join("solvers").join(binary_name);
        if local.exists() {
            return Ok(local);
        }
    }

    if let Ok(path) = which::which(binary_name) {
        return Ok(path);
    }

    Err(SolveError::NotInstalled { kind })
}

/// Check whether a solver is installed and reachable.
pub fn is_solver_installed(kind: SolverKind) -> bool {
    find_binary(kind).is_ok()
}

/// All solvers currently reachable on this machine.
pub fn list_installed_solvers() -> Vec<SolverKind> {
    SolverKind::all()
        .iter()
        .copied()
        .filter(|&kind| is_solver_installed(kind))
        .collect()
}
