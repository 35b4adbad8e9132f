//! # atj-algo: Alcohol-to-Jet Supply Chain Optimization
//!
//! This crate turns an [`atj_core::CaseData`] plus policy scalars into a
//! mixed-integer linear program over the sugarcane-to-SAF supply chain,
//! solves it with a `good_lp` backend and extracts per-entity results.
//!
//! ## Pipeline
//!
//! | Stage | Type | Notes |
//! |-------|------|-------|
//! | Resolve | [`sc_model::Registry`] | ordered sets, dense distances, required tables |
//! | Declare | [`sc_model::VariableRegistry`] | named variables, pinned by tier and state |
//! | Constrain | [`sc_model::SupplyChainModel`] | balances, markets, CAPEX surrogate |
//! | Solve | [`sc_model::SolveReport`] | status as data, never an error |
//! | Extract | [`sc_model::SupplyChainSolution`] | flows, connections, economics |
//!
//! ## Solver Backends
//!
//! `microlp` is always compiled in. The `solver-highs` feature adds HiGHS for
//! networks too large for the pure-Rust branch and bound.
//!
//! ## Example
//!
//! ```ignore
//! use atj_algo::{MarketParameters, MilpSolverKind, Policy, SupplyChainModel};
//!
//! let case = atj_core::CaseData::load("sao_paulo.yaml")?;
//! let model = SupplyChainModel::build(&case, &Policy::new(0.1, 700_000.0), &MarketParameters::default())?;
//! let report = model.solve(MilpSolverKind::Microlp);
//! println!("{}", report.status);
//! ```

pub mod sc_model;
pub mod test_utils;

pub use sc_model::{
    BlendingPolicy, CapexCurve, ConstraintFamily, FlowMatrix, InvestmentFix, InvestmentState,
    Lane, LogisticsLane, MarketParameters, MilpSolverKind, ModelStats, ObjectiveMode,
    ParameterOverrides, Policy, Registry, SolveReport, SolveStatus, SupplyChainModel,
    SupplyChainSolution, FLOW_EPSILON,
};
