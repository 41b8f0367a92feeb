//! CBC backend: row-oriented solution files with prefixed tokens.
//!
//! CBC is driven through its command-line interface and writes a solution
//! file whose first line states the overall verdict, e.g.
//!
//! ```text
//! Optimal - objective value 42.0
//!       0 x0            7.5            0
//!       0 c0           42.0          1.5
//! ```
//!
//! Every remaining row is a whitespace-delimited quadruple of row index,
//! token, value and dual; tokens prefixed `x` carry variable values in the
//! third column, everything else carries constraint duals in the fourth.

use crate::backend::{basis_path, remove_files, run_command, SolveOptions, SolverBackend};
use crate::error::{SolveError, SolveResult};
use crate::outcome::{Solution, SolverOutcome, TerminationCondition};
use crate::SolverKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

const OPTIMAL_HEADER: &str = "Optimal - objective value";

/// Backend shelling out to the `cbc` executable.
pub struct CbcBackend {
    binary: PathBuf,
}

impl CbcBackend {
    /// Locate the `cbc` executable and build a backend around it.
    pub fn new() -> SolveResult<Self> {
        Ok(Self {
            binary: crate::find_binary(SolverKind::Cbc)?,
        })
    }

    /// Use an explicit executable path.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl SolverBackend for CbcBackend {
    fn solve(&self, problem: &Path, opts: &SolveOptions) -> SolveResult<SolverOutcome> {
        let solution_fn = opts.solution_path_for(problem);

        // -printingOptions all makes CBC write every row into the solution
        // file, not just the nonzero ones.
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-printingOptions")
            .arg("all")
            .arg("-import")
            .arg(problem);
        if let Some(warm) = &opts.warmstart {
            cmd.arg("-basisI").arg(warm);
        }
        for fragment in &opts.options {
            for part in fragment.split_whitespace() {
                cmd.arg(part);
            }
        }
        cmd.arg("-solve").arg("-solu").arg(&solution_fn);
        let basis = opts.store_basis.then(|| basis_path(&solution_fn));
        if let Some(basis) = &basis {
            cmd.arg("-basisO").arg(basis);
        }

        run_command(cmd, opts.log_path.as_deref())?;

        let (status, termination, solution) = parse_solution(&solution_fn)?;
        info!(%termination, "cbc finished");
        if !termination.is_optimal() {
            return Ok(SolverOutcome::no_solution(status, termination));
        }
        if !opts.keep_files {
            remove_files([problem, solution_fn.as_path()]);
        }
        Ok(SolverOutcome {
            status,
            termination,
            solution,
            basis_path: basis,
        })
    }
}

/// Parse a CBC solution file into the normalized result triple.
///
/// Exposed so results written by an earlier run can be read back without
/// re-invoking the solver.
pub fn parse_solution(
    path: &Path,
) -> SolveResult<(String, TerminationCondition, Option<Solution>)> {
    let data = std::fs::read_to_string(path).map_err(|source| SolveError::MissingSolution {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = data.lines();
    let header = lines.next().unwrap_or_default();

    let termination = if header.starts_with(OPTIMAL_HEADER) {
        TerminationCondition::Optimal
    } else if header.contains("Infeasible") {
        TerminationCondition::Infeasible
    } else {
        TerminationCondition::Other
    };
    let status = termination.to_string();
    if !termination.is_optimal() {
        return Ok((status, termination, None));
    }

    let objective: f64 = header[OPTIMAL_HEADER.len()..]
        .trim()
        .parse()
        .map_err(|_| malformed(path, format!("bad objective in header {header:?}")))?;

    let mut solution = Solution {
        objective,
        ..Default::default()
    };
    for (lineno, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields: Vec<&str> = line.split_whitespace().collect();
        // CBC flags superbasic rows with a leading "**" marker.
        if fields.first() == Some(&"**") {
            fields.remove(0);
        }
        if fields.len() < 4 {
            return Err(malformed(path, format!("short row at line {}", lineno + 2)));
        }
        let token = fields[1];
        if token.starts_with('x') {
            let value = parse_field(path, fields[2], lineno)?;
            solution.variables.insert(token.to_string(), value);
        } else {
            let dual = parse_field(path, fields[3], lineno)?;
            solution.duals.insert(token.to_string(), dual);
        }
    }
    Ok((status, termination, Some(solution)))
}

fn parse_field(path: &Path, field: &str, lineno: usize) -> SolveResult<f64> {
    field
        .parse()
        .map_err(|_| malformed(path, format!("bad number {field:?} at line {}", lineno + 2)))
}

fn malformed(path: &Path, message: String) -> SolveError {
    SolveError::Parse {
        path: path.to_path_buf(),
        message,
    }
}
