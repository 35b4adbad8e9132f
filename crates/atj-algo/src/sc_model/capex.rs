//! Piecewise-linear CAPEX surrogate
//!
//! The capital cost of SAF capacity follows a concave power law
//!
//! ```text
//! cost(c) = ref_capex · markup · (c / (ref_flow · et_to_saf))^n / amortization
//! ```
//!
//! which is sampled at `N` evenly spaced breakpoints on `[0, max_capacity]`.
//! Inside the MILP, capacity and CAPEX are the same interpolation of those
//! samples over interval weights `w_k ∈ [0,1]`:
//!
//! ```text
//! capacity = b_0 + Σ_k (b_{k+1} - b_k) · w_k
//! CAPEX    = cost_0 + Σ_k (cost_{k+1} - cost_k) · w_k
//! w_k ≥ a_k ≥ w_{k+1},  a_k ∈ {0,1}
//! ```
//!
//! The activation binaries force intervals to fill strictly in order, which
//! is what keeps the surrogate exact for a concave curve.

use atj_core::{AtjError, AtjResult, Product, Tier};
use good_lp::{constraint, Expression};
use serde::Serialize;

use super::model::{BuildContext, ConstraintFamily, ConstraintSet, TierCurves};
use super::variables::TierVariables;

/// Sampled cost curve for one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapexCurve {
    breakpoints: Vec<f64>,
    costs: Vec<f64>,
}

impl CapexCurve {
    /// Sample the power-law curve.
    ///
    /// `reference_saf` is the SAF output of the reference plant
    /// (`ref_flow · et_to_saf`); `scale` folds in reference CAPEX, markup and
    /// amortization.
    pub fn new(
        max_capacity: f64,
        breakpoints: usize,
        scale: f64,
        reference_saf: f64,
        exponent: f64,
    ) -> AtjResult<Self> {
        if breakpoints < 2 {
            return Err(AtjError::Formulation(format!(
                "breakpoints must be at least 2, got {}",
                breakpoints
            )));
        }
        if !(max_capacity.is_finite() && max_capacity > 0.0) {
            return Err(AtjError::Formulation(format!(
                "max SAF capacity must be positive, got {}",
                max_capacity
            )));
        }
        if !(reference_saf.is_finite() && reference_saf > 0.0) {
            return Err(AtjError::Formulation(format!(
                "reference SAF output must be positive, got {}",
                reference_saf
            )));
        }

        let last = (breakpoints - 1) as f64;
        let points: Vec<f64> = (0..breakpoints)
            .map(|k| max_capacity * k as f64 / last)
            .collect();
        let costs = points
            .iter()
            .map(|&c| scale * (c / reference_saf).powf(exponent))
            .collect();

        Ok(Self {
            breakpoints: points,
            costs,
        })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Number of interpolation intervals (`N - 1`).
    pub fn intervals(&self) -> usize {
        self.breakpoints.len() - 1
    }

    pub fn max_capacity(&self) -> f64 {
        self.breakpoints[self.breakpoints.len() - 1]
    }

    /// Width of interval `k`.
    pub fn capacity_step(&self, k: usize) -> f64 {
        self.breakpoints[k + 1] - self.breakpoints[k]
    }

    /// Cost increment across interval `k`.
    pub fn cost_step(&self, k: usize) -> f64 {
        self.costs[k + 1] - self.costs[k]
    }

    /// Canonical fill-order weights reproducing `capacity`.
    ///
    /// Capacities outside `[0, max]` are clamped.
    pub fn weights_for(&self, capacity: f64) -> Vec<f64> {
        let c = capacity.clamp(self.breakpoints[0], self.max_capacity());
        (0..self.intervals())
            .map(|k| {
                let lo = self.breakpoints[k];
                let step = self.capacity_step(k);
                if c >= self.breakpoints[k + 1] {
                    1.0
                } else if c <= lo || step <= 0.0 {
                    0.0
                } else {
                    (c - lo) / step
                }
            })
            .collect()
    }

    /// Evaluate the surrogate at `capacity`.
    pub fn interpolate(&self, capacity: f64) -> f64 {
        self.evaluate_weights(&self.weights_for(capacity))
    }

    /// CAPEX implied by a set of interval weights.
    pub fn evaluate_weights(&self, weights: &[f64]) -> f64 {
        self.costs[0]
            + weights
                .iter()
                .enumerate()
                .take(self.intervals())
                .map(|(k, w)| self.cost_step(k) * w)
                .sum::<f64>()
    }

    /// Capacity implied by a set of interval weights.
    pub fn capacity_of_weights(&self, weights: &[f64]) -> f64 {
        self.breakpoints[0]
            + weights
                .iter()
                .enumerate()
                .take(self.intervals())
                .map(|(k, w)| self.capacity_step(k) * w)
                .sum::<f64>()
    }
}

/// CAPEX of entity `e` as an expression of its interval weights.
pub(crate) fn capex_expression(curve: &CapexCurve, vars: &TierVariables, e: usize) -> Expression {
    let mut capex = Expression::from(curve.costs[0]);
    for (k, w) in vars.weights[e].iter().enumerate() {
        capex += curve.cost_step(k) * *w;
    }
    capex
}

/// Capacity link and sequential activation for every entity of every tier.
pub(crate) fn add_piecewise_constraints(
    ctx: &BuildContext<'_>,
    curves: &TierCurves,
    out: &mut ConstraintSet,
) {
    for tier in Tier::ALL {
        let curve = curves.tier(tier);
        let vars = ctx.vars.tier(tier);
        for e in 0..vars.len() {
            let mut capacity = Expression::from(curve.breakpoints[0]);
            for (k, w) in vars.weights[e].iter().enumerate() {
                capacity += curve.capacity_step(k) * *w;
            }
            out.push(
                ConstraintFamily::Piecewise,
                constraint!(vars.get(e, Product::Saf) == capacity),
            );

            let weights = &vars.weights[e];
            for (k, a) in vars.activations[e].iter().enumerate() {
                out.push(ConstraintFamily::Piecewise, constraint!(weights[k] >= *a));
                out.push(ConstraintFamily::Piecewise, constraint!(*a >= weights[k + 1]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(max: f64, n: usize) -> CapexCurve {
        CapexCurve::new(max, n, 1000.0, 50.0, 0.65).unwrap()
    }

    #[test]
    fn test_breakpoints_evenly_spaced() {
        let c = curve(100.0, 3);
        assert_eq!(c.breakpoints(), &[0.0, 50.0, 100.0]);
        assert_eq!(c.intervals(), 2);
        assert_eq!(c.costs()[0], 0.0);
        assert!((c.costs()[1] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_at_breakpoint_fills_first_interval_only() {
        let c = curve(100.0, 3);
        let w = c.weights_for(50.0);
        assert_eq!(w, vec![1.0, 0.0]);
        assert!((c.interpolate(50.0) - c.costs()[1]).abs() < 1e-9);
        assert!((c.capacity_of_weights(&w) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_costs_monotone_and_concave() {
        let c = curve(700.0, 10);
        let costs = c.costs();
        for k in 0..c.intervals() {
            assert!(costs[k + 1] >= costs[k], "cost decreased at breakpoint {}", k + 1);
        }
        for k in 1..c.intervals() {
            assert!(c.cost_step(k) <= c.cost_step(k - 1) + 1e-9);
        }
    }

    #[test]
    fn test_interpolation_between_breakpoints() {
        let c = curve(100.0, 3);
        let mid = c.interpolate(75.0);
        let expected = c.costs()[1] + 0.5 * (c.costs()[2] - c.costs()[1]);
        assert!((mid - expected).abs() < 1e-9);
        // Chord lies below the concave curve
        assert!(mid <= 1000.0 * (75.0_f64 / 50.0).powf(0.65));
    }

    #[test]
    fn test_zero_capacity_costs_breakpoint_zero() {
        let c = curve(100.0, 5);
        assert_eq!(c.interpolate(0.0), c.costs()[0]);
        assert_eq!(c.weights_for(-3.0), vec![0.0; 4]);
        assert_eq!(c.weights_for(1e9), vec![1.0; 4]);
    }

    #[test]
    fn test_piecewise_rows_per_entity() {
        use crate::sc_model::SupplyChainModel;
        use crate::test_utils::{small_case, small_market, small_policy};

        // capacity link plus two sequencing rows per activation
        let model =
            SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market()).unwrap();
        let rows = model.stats().constraints_by_family[&ConstraintFamily::Piecewise];
        assert_eq!(rows, 4 * (1 + 2));

        let model = SupplyChainModel::build(
            &small_case(),
            &small_policy(0.2).with_breakpoints(2),
            &small_market(),
        )
        .unwrap();
        let rows = model.stats().constraints_by_family[&ConstraintFamily::Piecewise];
        assert_eq!(rows, 4);
    }

    #[test]
    fn test_rejects_degenerate_curves() {
        assert!(CapexCurve::new(100.0, 1, 1.0, 1.0, 0.65).is_err());
        assert!(CapexCurve::new(0.0, 3, 1.0, 1.0, 0.65).is_err());
        assert!(CapexCurve::new(100.0, 3, 1.0, 0.0, 0.65).is_err());
    }
}
