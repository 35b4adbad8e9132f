//! Alcohol-to-jet supply chain MILP
//!
//! This module formulates the sugarcane-to-SAF supply chain as a
//! Mixed-Integer Linear Program and hands it to a `good_lp` backend.
//!
//! ## Problem Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ALCOHOL-TO-JET SUPPLY CHAIN                                             │
//! │  ───────────────────────────                                             │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Sugarcane mills with crushing capacity (annexed, ethanol-only)     │
//! │    • Airports with jet fuel demand                                      │
//! │    • Oil refineries able to blend SAF                                   │
//! │    • Distances, conversion rates, prices and costs                     │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Juice split between sugar and ethanol at every mill                │
//! │    • Where to build SAF capacity (binary per mill/airport/refinery)     │
//! │    • Ethanol and SAF shipments on six lanes                             │
//! │                                                                          │
//! │  Optimize:                                                               │
//! │    profit mode: max revenue - OPEX - CAPEX - logistics                  │
//! │    cost mode:   min OPEX + CAPEX + logistics + external purchases       │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Mass balances of the conversion network                           │
//! │    • Sell-or-buy ethanol disjunction per investment binary             │
//! │    • Blend mandate at every airport                                     │
//! │    • Sugar, ground-transport energy and corn ethanol markets            │
//! │    • Piecewise-linear concave CAPEX                                     │
//! │    • Every mill profitable on its own                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow Lanes
//!
//! ```text
//!   mill ──et──▶ mill          mill ──et/saf──▶ refinery ──blend──▶ airport
//!   mill ──et/saf──────────────────────────────────────────────────▶ airport
//! ```
//!
//! ## Investment States
//!
//! Each entity is `Undecided` (free binary, big-M disjunction), `Producer`
//! (binary 0, may only sell ethanol) or `Converter` (binary 1, may only buy
//! ethanol). Fixed states are applied through [`Policy::investment_fixes`].
//!
//! ## Example
//!
//! ```no_run
//! use atj_algo::sc_model::{MarketParameters, MilpSolverKind, Policy, SupplyChainModel};
//! use atj_core::CaseData;
//! use std::path::Path;
//!
//! let case = CaseData::load(Path::new("case.yaml"))?;
//! let policy = Policy::new(0.1, 700_000.0).with_premiums(200.0, 50.0);
//! let model = SupplyChainModel::build(&case, &policy, &MarketParameters::default())?;
//! let report = model.solve(MilpSolverKind::default());
//! if let Some(solution) = &report.solution {
//!     println!("{}", solution.summary());
//! }
//! # Ok::<(), atj_core::AtjError>(())
//! ```

mod capex;
mod market;
mod mass_balance;
mod model;
mod objective;
mod params;
mod registry;
mod solution;
mod solver;
mod variables;

pub use capex::CapexCurve;
pub use model::{
    ConstraintFamily, ConstraintSet, ModelLayout, ModelStats, SupplyChainModel, TierCurves,
};
pub use objective::{MillExpressions, ModelExpressions, SiteExpressions};
pub use params::{
    BlendingPolicy, InvestmentFix, InvestmentState, MarketParameters, ObjectiveMode,
    ParameterOverrides, Policy,
};
pub use registry::{AirportEntry, Conversions, Distances, MillEntry, Prices, Registry};
pub use solution::{
    FlowMatrix, MillResult, PurchaseResult, SiteResult, SupplyChainSolution, FLOW_EPSILON,
};
pub use solver::{MilpSolverKind, SolveReport, SolveStatus};
pub use variables::{
    tier_uses, FlowLane, InvestmentStates, Lane, LogisticsLane, Purchases, TierVariables,
    VariableCounts, VariableRegistry,
};
