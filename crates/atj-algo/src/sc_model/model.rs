//! Model assembly
//!
//! Construction runs in a fixed order: sets, parameters, variables,
//! constraints, objective. Any configuration or formulation error surfaces
//! before the first constraint is written, so a partial model never escapes.

use std::collections::BTreeMap;
use std::fmt;

use atj_core::{AtjResult, CaseData, Diagnostics, Tier};
use good_lp::{Constraint, Expression, ProblemVariables};
use serde::Serialize;
use tracing::{debug, info};

use super::capex::{self, CapexCurve};
use super::mass_balance;
use super::market;
use super::objective::{self, ModelExpressions};
use super::params::{MarketParameters, ObjectiveMode, Policy};
use super::registry::Registry;
use super::variables::{InvestmentStates, VariableCounts, VariableRegistry};

/// Families used to group constraint counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    MassBalance,
    EthanolSplit,
    SafSplit,
    MillKind,
    LaneBalance,
    Disjunction,
    InvestmentBounds,
    Demand,
    MarketBounds,
    Piecewise,
    Profitability,
}

impl ConstraintFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::MassBalance => "mass_balance",
            ConstraintFamily::EthanolSplit => "ethanol_split",
            ConstraintFamily::SafSplit => "saf_split",
            ConstraintFamily::MillKind => "mill_kind",
            ConstraintFamily::LaneBalance => "lane_balance",
            ConstraintFamily::Disjunction => "disjunction",
            ConstraintFamily::InvestmentBounds => "investment_bounds",
            ConstraintFamily::Demand => "demand",
            ConstraintFamily::MarketBounds => "market_bounds",
            ConstraintFamily::Piecewise => "piecewise",
            ConstraintFamily::Profitability => "profitability",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints in insertion order, tagged by family.
#[derive(Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
    families: Vec<ConstraintFamily>,
}

impl ConstraintSet {
    pub fn push(&mut self, family: ConstraintFamily, constraint: Constraint) {
        self.constraints.push(constraint);
        self.families.push(family);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn count_by_family(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for family in &self.families {
            *counts.entry(*family).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn into_constraints(self) -> Vec<Constraint> {
        self.constraints
    }
}

/// Read-only view shared by the constraint builders.
pub(crate) struct BuildContext<'a> {
    pub registry: &'a Registry,
    pub policy: &'a Policy,
    pub market: &'a MarketParameters,
    pub states: &'a InvestmentStates,
    pub vars: &'a VariableRegistry,
}

/// CAPEX curves of the three tiers.
///
/// Every tier, mills included, scales against `reference_flow · et_to_saf`
/// from the case conversions rather than a fixed mill yield.
#[derive(Debug, Clone, Serialize)]
pub struct TierCurves {
    pub mill: CapexCurve,
    pub airport: CapexCurve,
    pub refinery: CapexCurve,
}

impl TierCurves {
    pub fn new(registry: &Registry, policy: &Policy, market: &MarketParameters) -> AtjResult<Self> {
        let reference_saf = market.reference_flow * registry.conversions.et_to_saf;
        let curve = |tier: Tier| {
            let scale = market.reference_capex * policy.capex_markup(tier) / market.amortization;
            CapexCurve::new(
                policy.max_saf_capacity,
                policy.breakpoints,
                scale,
                reference_saf,
                market.capex_exponent,
            )
        };
        Ok(Self {
            mill: curve(Tier::Mill)?,
            airport: curve(Tier::Airport)?,
            refinery: curve(Tier::Refinery)?,
        })
    }

    pub fn tier(&self, tier: Tier) -> &CapexCurve {
        match tier {
            Tier::Mill => &self.mill,
            Tier::Airport => &self.airport,
            Tier::Refinery => &self.refinery,
        }
    }
}

/// Size of a built model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub mills: usize,
    pub airports: usize,
    pub refineries: usize,
    pub breakpoints: usize,
    pub objective: ObjectiveMode,
    pub variables: VariableCounts,
    pub constraints: usize,
    pub constraints_by_family: BTreeMap<ConstraintFamily, usize>,
}

impl ModelStats {
    pub fn num_variables(&self) -> usize {
        self.variables.total()
    }
}

/// Everything about a model that outlives the solve: sets, parameters,
/// variable handles and derived expressions.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    pub registry: Registry,
    pub policy: Policy,
    pub market: MarketParameters,
    pub states: InvestmentStates,
    pub vars: VariableRegistry,
    pub curves: TierCurves,
    pub expressions: ModelExpressions,
    pub stats: ModelStats,
}

/// A fully constrained supply chain MILP, ready for a solver.
pub struct SupplyChainModel {
    pub(crate) problem: ProblemVariables,
    pub(crate) constraints: ConstraintSet,
    pub(crate) objective: Expression,
    pub(crate) layout: ModelLayout,
}

impl SupplyChainModel {
    /// Build the model for `case` under `policy` and `market`.
    pub fn build(case: &CaseData, policy: &Policy, market: &MarketParameters) -> AtjResult<Self> {
        policy.validate()?;
        market.validate()?;

        let registry = Registry::resolve(case)?;
        let states = InvestmentStates::resolve(&registry, policy)?;
        let curves = TierCurves::new(&registry, policy, market)?;

        let mut problem = ProblemVariables::new();
        let vars = VariableRegistry::declare(&mut problem, &registry, policy, &states);
        debug!(
            variables = vars.counts.total(),
            binaries = vars.counts.binaries,
            "declared decision variables"
        );

        let mut constraints = ConstraintSet::default();
        let expressions = {
            let ctx = BuildContext {
                registry: &registry,
                policy,
                market,
                states: &states,
                vars: &vars,
            };

            mass_balance::add_mill_balances(&ctx, &mut constraints);
            mass_balance::add_greenfield_balances(&ctx, &mut constraints);
            market::add_lane_balances(&ctx, &mut constraints);
            market::add_disjunctions(&ctx, &mut constraints);
            market::add_investment_bounds(&ctx, &mut constraints);
            market::add_demand(&ctx, &mut constraints);
            market::add_market_bounds(&ctx, &mut constraints);
            capex::add_piecewise_constraints(&ctx, &curves, &mut constraints);

            let expressions = ModelExpressions::assemble(&ctx, &curves);
            objective::add_profitability(&expressions, &mut constraints);
            expressions
        };
        let objective = expressions.objective(policy.objective);

        let stats = ModelStats {
            mills: registry.num_mills(),
            airports: registry.num_airports(),
            refineries: registry.num_refineries(),
            breakpoints: policy.breakpoints,
            objective: policy.objective,
            variables: vars.counts,
            constraints: constraints.len(),
            constraints_by_family: constraints.count_by_family(),
        };
        info!(
            mills = stats.mills,
            airports = stats.airports,
            refineries = stats.refineries,
            variables = stats.num_variables(),
            constraints = stats.constraints,
            objective = %stats.objective,
            "built supply chain model"
        );

        Ok(Self {
            problem,
            constraints,
            objective,
            layout: ModelLayout {
                registry,
                policy: policy.clone(),
                market: market.clone(),
                states,
                vars,
                curves,
                expressions,
                stats,
            },
        })
    }

    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }

    pub fn stats(&self) -> &ModelStats {
        &self.layout.stats
    }

    pub fn registry(&self) -> &Registry {
        &self.layout.registry
    }

    /// Non-fatal findings from input resolution.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.layout.registry.diagnostics
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.layout.vars
    }

    pub fn expressions(&self) -> &ModelExpressions {
        &self.layout.expressions
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.problem.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

impl fmt::Debug for SupplyChainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupplyChainModel")
            .field("variables", &self.problem.len())
            .field("constraints", &self.constraints.len())
            .field("stats", &self.layout.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{small_case, small_market, small_policy};
    use atj_core::AtjError;

    #[test]
    fn test_build_small_network() {
        let model = SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market())
            .unwrap();

        assert_eq!(model.num_variables(), model.stats().num_variables());
        assert_eq!(model.num_constraints(), model.stats().constraints);
        let family_total: usize = model.stats().constraints_by_family.values().sum();
        assert_eq!(family_total, model.num_constraints());
        assert_eq!(model.stats().breakpoints, 3);
        assert_eq!(model.layout().curves.mill.breakpoints(), &[0.0, 200.0, 400.0]);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let a = SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market())
            .unwrap();
        let b = SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market())
            .unwrap();
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_formulation_errors_before_constraints() {
        let policy = small_policy(0.2).with_breakpoints(1);
        let err = SupplyChainModel::build(&small_case(), &policy, &small_market()).unwrap_err();
        assert!(matches!(err, AtjError::Formulation(_)));

        let mut case = small_case();
        case.mills[0].capacity = -1.0;
        let err = SupplyChainModel::build(&case, &small_policy(0.2), &small_market()).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_greenfield_curves_carry_markup() {
        let model = SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market())
            .unwrap();
        let curves = &model.layout().curves;
        let ratio = curves.airport.costs()[2] / curves.mill.costs()[2];
        assert!((ratio - 1.5).abs() < 1e-9);
        assert_eq!(curves.refinery, curves.airport);
    }

    #[test]
    fn test_mill_curve_scales_with_case_yield() {
        // reference flow 400 at et_to_saf 0.5 puts the reference plant at 200
        let model = SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market())
            .unwrap();
        let mill = &model.layout().curves.mill;
        assert_eq!(mill.breakpoints()[1], 200.0);
        assert!((mill.costs()[1] - 1000.0).abs() < 1e-9);
    }
}
