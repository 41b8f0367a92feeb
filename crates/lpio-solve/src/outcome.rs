//! Normalized solver outcome.
//!
//! Three structurally different solver output conventions reduce to this
//! one record: a status string as reported, an enumerated termination
//! condition, and, only for optimal terminations, the variable values,
//! constraint duals and objective.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The solver's final verdict on a solve attempt, distinct from
/// process-level success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCondition {
    /// Optimal solution found; the only condition carrying solution data.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Anything else the solver reported.
    Other,
}

impl TerminationCondition {
    pub fn is_optimal(&self) -> bool {
        matches!(self, TerminationCondition::Optimal)
    }

    /// Classify a solver-reported status string. Only the exact `optimal`
    /// keyword carries solution data, so everything else maps
    /// conservatively.
    pub fn from_status(status: &str) -> Self {
        let status = status.trim().to_lowercase();
        if status == "optimal" {
            TerminationCondition::Optimal
        } else if status.contains("infeasible") {
            TerminationCondition::Infeasible
        } else if status.contains("unbounded") {
            TerminationCondition::Unbounded
        } else {
            TerminationCondition::Other
        }
    }
}

impl std::fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationCondition::Optimal => write!(f, "optimal"),
            TerminationCondition::Infeasible => write!(f, "infeasible"),
            TerminationCondition::Unbounded => write!(f, "unbounded"),
            TerminationCondition::Other => write!(f, "other"),
        }
    }
}

/// Solved values of one optimal solve: token -> value mappings for
/// variables and constraint duals, plus the scalar objective.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Solution {
    pub variables: BTreeMap<String, f64>,
    pub duals: BTreeMap<String, f64>,
    pub objective: f64,
}

/// Normalized result of one solver invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome {
    /// Status text as the solver reported it, lowercased.
    pub status: String,
    /// Enumerated termination condition.
    pub termination: TerminationCondition,
    /// Solution data; present only when the termination is optimal.
    /// `None` means "no solution available", not a failure.
    pub solution: Option<Solution>,
    /// Where the solver's basis was persisted, when one was requested and
    /// the solver produced it.
    pub basis_path: Option<PathBuf>,
}

impl SolverOutcome {
    /// Outcome without solution data, for any non-optimal termination.
    pub fn no_solution(status: impl Into<String>, termination: TerminationCondition) -> Self {
        Self {
            status: status.into(),
            termination,
            solution: None,
            basis_path: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.termination.is_optimal()
    }
}
