//! Solver adapter
//!
//! Hands a built model to a `good_lp` MILP backend. Infeasibility and
//! unboundedness are outcomes of a well-formed model, so they come back as
//! [`SolveStatus`] data rather than errors.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use good_lp::{ResolutionError, Solver, SolverModel};
use serde::Serialize;
use tracing::{info, warn};
use web_time::Instant;

use super::model::{ModelStats, SupplyChainModel};
use super::params::ObjectiveMode;
use super::solution::SupplyChainSolution;

/// MILP backends compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilpSolverKind {
    /// Pure-Rust branch and bound
    #[default]
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl MilpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_MILP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpSolverKind::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => "highs",
        }
    }
}

const AVAILABLE_MILP_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown milp solver '{}'; supported values: {}",
        label,
        MilpSolverKind::available().join(", ")
    )
}

impl FromStr for MilpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => Ok(MilpSolverKind::Microlp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            other => Err(unknown_solver_error(other)),
        }
    }
}

impl fmt::Display for MilpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    SolverError(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => f.write_str("optimal"),
            SolveStatus::Infeasible => f.write_str("infeasible"),
            SolveStatus::Unbounded => f.write_str("unbounded"),
            SolveStatus::SolverError(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

/// Result of one solve call.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub solver: String,
    /// Present only when the status is optimal
    pub solution: Option<SupplyChainSolution>,
    pub solve_time: Duration,
    pub stats: ModelStats,
}

impl SolveReport {
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }
}

impl SupplyChainModel {
    /// Solve with one of the compiled-in backends.
    pub fn solve(self, kind: MilpSolverKind) -> SolveReport {
        match kind {
            MilpSolverKind::Microlp => {
                self.solve_with(kind.as_str(), good_lp::solvers::microlp::microlp)
            }
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => self.solve_with(kind.as_str(), good_lp::solvers::highs::highs),
        }
    }

    /// Solve with any `good_lp` backend reporting [`ResolutionError`].
    pub fn solve_with<S>(self, label: &str, solver: S) -> SolveReport
    where
        S: Solver,
        S::Model: SolverModel<Error = ResolutionError>,
    {
        let start = Instant::now();
        let SupplyChainModel {
            problem,
            constraints,
            objective,
            layout,
        } = self;

        let unsolved = match layout.policy.objective {
            ObjectiveMode::Profit => problem.maximise(objective),
            ObjectiveMode::Cost => problem.minimise(objective),
        };
        let mut model = unsolved.using(solver);
        for c in constraints.into_constraints() {
            model = model.with(c);
        }

        let (status, solution) = match model.solve() {
            Ok(raw) => (
                SolveStatus::Optimal,
                Some(SupplyChainSolution::extract(&layout, &raw)),
            ),
            Err(ResolutionError::Infeasible) => (SolveStatus::Infeasible, None),
            Err(ResolutionError::Unbounded) => (SolveStatus::Unbounded, None),
            Err(e) => (SolveStatus::SolverError(e.to_string()), None),
        };
        let solve_time = start.elapsed();

        match &solution {
            Some(s) => info!(
                solver = label,
                objective = s.objective_value,
                elapsed_ms = solve_time.as_millis() as u64,
                "solved supply chain model"
            ),
            None => warn!(solver = label, status = %status, "supply chain model not solved"),
        }

        SolveReport {
            status,
            solver: label.to_string(),
            solution,
            solve_time,
            stats: layout.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!("MicroLP".parse::<MilpSolverKind>().unwrap(), MilpSolverKind::Microlp);
        let err = "gurobi".parse::<MilpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("microlp"));
        assert!(MilpSolverKind::available().contains(&"microlp"));
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn test_highs_requires_feature() {
        assert!("highs".parse::<MilpSolverKind>().is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Infeasible.to_string(), "infeasible");
        assert!(SolveStatus::SolverError("boom".into()).to_string().contains("boom"));
        assert!(SolveStatus::Optimal.is_optimal());
    }
}
