//! In-process model backend: no solution file, no text parsing.
//!
//! Some solvers expose an in-process object model instead of a solution
//! file: the problem is read into a model handle, optimized, and status,
//! per-variable values and per-constraint duals are interrogated directly.
//! [`SolverModel`] is the seam a concrete binding implements;
//! [`ModelBackend`] drives it through the same [`SolverBackend`] contract
//! as the file-based dialects.

use crate::backend::{basis_path, remove_files, SolveOptions, SolverBackend};
use crate::error::{SolveError, SolveResult};
use crate::outcome::{Solution, SolverOutcome, TerminationCondition};
use std::path::Path;
use tracing::info;

/// One in-process solver model instance, consumed by a single solve.
pub trait SolverModel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the LP problem file into the model.
    fn read_problem(&mut self, path: &Path) -> Result<(), Self::Error>;

    /// Set one solver option.
    fn set_option(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Feed a warm-start basis.
    fn read_warmstart(&mut self, path: &Path) -> Result<(), Self::Error>;

    /// Run the solver to completion.
    fn optimize(&mut self) -> Result<(), Self::Error>;

    /// Raw status code after optimizing.
    fn status_code(&self) -> i32;

    /// The solver's status-enum → name table. Names map to lowercase before
    /// classification, so `OPTIMAL` and `Optimal` both work.
    fn status_name(code: i32) -> Option<&'static str>;

    /// Token → value for every variable in the model.
    fn variable_values(&self) -> Vec<(String, f64)>;

    /// Token → dual for every constraint in the model.
    fn constraint_duals(&self) -> Vec<(String, f64)>;

    /// Objective value of the current solution.
    fn objective(&self) -> f64;

    /// Persist the solver basis. May fail when no basis exists.
    fn write_basis(&self, path: &Path) -> Result<(), Self::Error>;
}

/// Backend driving a fresh [`SolverModel`] per solve.
pub struct ModelBackend<F> {
    build: F,
}

impl<M, F> ModelBackend<F>
where
    M: SolverModel,
    F: Fn() -> M,
{
    /// `build` constructs one model instance per [`solve`](SolverBackend::solve)
    /// call; models are never reused across solves.
    pub fn new(build: F) -> Self {
        Self { build }
    }
}

impl<M, F> SolverBackend for ModelBackend<F>
where
    M: SolverModel,
    F: Fn() -> M,
{
    fn solve(&self, problem: &Path, opts: &SolveOptions) -> SolveResult<SolverOutcome> {
        let mut model = (self.build)();
        model.read_problem(problem).map_err(boxed)?;
        for fragment in &opts.options {
            let (key, value) = fragment.split_once('=').unwrap_or((fragment.as_str(), ""));
            model.set_option(key.trim(), value.trim()).map_err(boxed)?;
        }
        if let Some(warm) = &opts.warmstart {
            model.read_warmstart(warm).map_err(boxed)?;
        }
        model.optimize().map_err(boxed)?;

        // A missing basis is normal for some terminations; log and move on.
        let mut stored_basis = None;
        if opts.store_basis {
            let basis = basis_path(&opts.solution_path_for(problem));
            match model.write_basis(&basis) {
                Ok(()) => stored_basis = Some(basis),
                Err(e) => info!("no model basis stored: {e}"),
            }
        }

        // There is no solution file in this dialect, only the problem file
        // is cleaned up.
        if !opts.keep_files {
            remove_files([problem]);
        }

        let code = model.status_code();
        let status = match M::status_name(code) {
            Some(name) => name.to_lowercase(),
            None => format!("unknown({code})"),
        };
        let termination = TerminationCondition::from_status(&status);
        info!(%termination, "model solve finished");
        if !termination.is_optimal() {
            return Ok(SolverOutcome::no_solution(status, termination));
        }

        let solution = Solution {
            variables: model.variable_values().into_iter().collect(),
            duals: model.constraint_duals().into_iter().collect(),
            objective: model.objective(),
        };
        Ok(SolverOutcome {
            status,
            termination,
            solution: Some(solution),
            basis_path: stored_basis,
        })
    }
}

fn boxed<E: std::error::Error + Send + Sync + 'static>(e: E) -> SolveError {
    SolveError::Model(Box::new(e))
}
