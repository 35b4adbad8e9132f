use atj_algo::{MarketParameters, MilpSolverKind, Policy, SolveReport, SupplyChainModel};
use atj_core::CaseData;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::spec::ResolvedPoint;

/// Base inputs every sweep point starts from.
#[derive(Debug, Clone, Default)]
pub struct SweepConfig {
    pub policy: Policy,
    pub market: MarketParameters,
    pub solver: MilpSolverKind,
}

/// Flat per-point record, suitable for a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub point_id: String,
    /// `optimal`, `infeasible`, `unbounded`, `solver_error` or `error`
    pub status: String,
    pub error: Option<String>,
    pub objective_value: Option<f64>,
    pub total_profit: Option<f64>,
    pub total_cost: Option<f64>,
    pub saf_delivered: Option<f64>,
    pub jet_fuel: Option<f64>,
    pub capex: Option<f64>,
    pub investments: Option<usize>,
    pub solve_time_ms: Option<f64>,
}

impl SweepRecord {
    pub fn is_optimal(&self) -> bool {
        self.status == "optimal"
    }

    fn failed(point_id: &str, error: String) -> Self {
        Self {
            point_id: point_id.to_string(),
            status: "error".to_string(),
            error: Some(error),
            objective_value: None,
            total_profit: None,
            total_cost: None,
            saf_delivered: None,
            jet_fuel: None,
            capex: None,
            investments: None,
            solve_time_ms: None,
        }
    }

    fn from_report(point_id: &str, report: &SolveReport) -> Self {
        let solution = report.solution.as_ref();
        let (status, error) = match &report.status {
            atj_algo::SolveStatus::Optimal => ("optimal", None),
            atj_algo::SolveStatus::Infeasible => ("infeasible", None),
            atj_algo::SolveStatus::Unbounded => ("unbounded", None),
            atj_algo::SolveStatus::SolverError(msg) => ("solver_error", Some(msg.clone())),
        };
        Self {
            point_id: point_id.to_string(),
            status: status.to_string(),
            error,
            objective_value: solution.map(|s| s.objective_value),
            total_profit: solution.map(|s| s.total_profit),
            total_cost: solution.map(|s| s.total_cost),
            saf_delivered: solution.map(|s| s.total_saf_delivered()),
            jet_fuel: solution.map(|s| s.purchases.jet_fuel),
            capex: solution.map(|s| s.capex),
            investments: solution.map(|s| s.investors().len()),
            solve_time_ms: Some(report.solve_time.as_secs_f64() * 1000.0),
        }
    }
}

/// Result of one sweep point.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub point: ResolvedPoint,
    pub record: SweepRecord,
    /// Absent when the model could not be built
    pub report: Option<SolveReport>,
}

/// Counts over a finished sweep.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub optimal: usize,
    pub failed: usize,
    pub outcomes: Vec<SweepOutcome>,
}

impl SweepSummary {
    pub fn records(&self) -> Vec<SweepRecord> {
        self.outcomes.iter().map(|o| o.record.clone()).collect()
    }
}

/// Build and solve one point from the base inputs.
///
/// The base case and config are never mutated; each point patches its own
/// copy of the parameters and builds a fresh model.
pub fn run_point(case: &CaseData, point: &ResolvedPoint, config: &SweepConfig) -> SweepOutcome {
    let (policy, market) = point.overrides.apply(&config.policy, &config.market);
    match SupplyChainModel::build(case, &policy, &market) {
        Ok(model) => {
            let report = model.solve(config.solver);
            let record = SweepRecord::from_report(&point.point_id, &report);
            SweepOutcome {
                point: point.clone(),
                record,
                report: Some(report),
            }
        }
        Err(err) => {
            warn!(point = %point.point_id, error = %err, "sweep point failed to build");
            SweepOutcome {
                point: point.clone(),
                record: SweepRecord::failed(&point.point_id, err.to_string()),
                report: None,
            }
        }
    }
}

/// Run every point in order, one model at a time.
pub fn run_sweep(case: &CaseData, points: &[ResolvedPoint], config: &SweepConfig) -> SweepSummary {
    let mut outcomes = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        info!(point = %point.point_id, index = i + 1, total = points.len(), "running sweep point");
        outcomes.push(run_point(case, point, config));
    }
    let optimal = outcomes.iter().filter(|o| o.record.is_optimal()).count();
    SweepSummary {
        optimal,
        failed: outcomes.len() - optimal,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atj_algo::test_utils::{small_case, small_market, small_policy};
    use atj_algo::ParameterOverrides;

    fn point(id: &str, overrides: ParameterOverrides) -> ResolvedPoint {
        ResolvedPoint {
            point_id: id.to_string(),
            description: None,
            tags: Vec::new(),
            overrides,
        }
    }

    fn config() -> SweepConfig {
        SweepConfig {
            policy: small_policy(0.0),
            market: small_market(),
            solver: MilpSolverKind::Microlp,
        }
    }

    #[test]
    fn build_errors_become_records() {
        let bad = point(
            "too-few-breakpoints",
            ParameterOverrides {
                breakpoints: Some(1),
                ..Default::default()
            },
        );
        let outcome = run_point(&small_case(), &bad, &config());
        assert_eq!(outcome.record.status, "error");
        assert!(outcome.record.error.as_deref().unwrap().contains("breakpoints"));
        assert!(outcome.report.is_none());
    }

    #[test]
    fn sweep_runs_points_in_order() {
        let points = vec![
            point("zero", ParameterOverrides::default()),
            point(
                "mandate",
                ParameterOverrides {
                    blend: Some(0.2),
                    ..Default::default()
                },
            ),
            point(
                "impossible",
                ParameterOverrides {
                    blend: Some(1.0),
                    ..Default::default()
                },
            ),
        ];
        let summary = run_sweep(&small_case(), &points, &config());
        let ids: Vec<_> = summary.records().iter().map(|r| r.point_id.clone()).collect();
        assert_eq!(ids, vec!["zero", "mandate", "impossible"]);
        assert_eq!(summary.optimal, 2);
        assert_eq!(summary.failed, 1);

        let mandate = &summary.outcomes[1].record;
        assert!((mandate.saf_delivered.unwrap() - 200.0).abs() < 1e-4);
        assert_eq!(summary.outcomes[2].record.status, "infeasible");
    }
}
