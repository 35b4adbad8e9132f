//! Decision variable registry
//!
//! One nonnegative variable per (entity, product) at every tier, six flow
//! lanes, investment binaries, piecewise weights/activations, global market
//! purchases and per-mill incentives. Products a tier never uses, trade
//! terms excluded by a fixed investment state and switched-off options are
//! pinned through their bounds at declaration time.

use atj_core::{AtjError, AtjResult, Product, Tier};
use good_lp::{variable, ProblemVariables, Variable};
use serde::Serialize;
use std::fmt;

use super::params::{InvestmentState, Policy};
use super::registry::Registry;

/// Products that carry meaning at a tier.
pub fn tier_uses(tier: Tier, product: Product) -> bool {
    match tier {
        Tier::Mill => product != Product::BlendedSaf,
        Tier::Airport => matches!(
            product,
            Product::Ethanol | Product::Saf | Product::Gasoline | Product::Diesel
        ),
        Tier::Refinery => matches!(
            product,
            Product::Ethanol
                | Product::Saf
                | Product::SafToRefineries
                | Product::Gasoline
                | Product::Diesel
                | Product::BlendedSaf
        ),
    }
}

/// Resolved investment state of every entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentStates {
    pub mills: Vec<InvestmentState>,
    pub airports: Vec<InvestmentState>,
    pub refineries: Vec<InvestmentState>,
}

impl InvestmentStates {
    /// Apply the policy fixes in order; later fixes override earlier ones.
    pub fn resolve(registry: &Registry, policy: &Policy) -> AtjResult<Self> {
        let mut states = Self {
            mills: vec![InvestmentState::Undecided; registry.num_mills()],
            airports: vec![InvestmentState::Undecided; registry.num_airports()],
            refineries: vec![InvestmentState::Undecided; registry.num_refineries()],
        };

        for fix in &policy.investment_fixes {
            let state = InvestmentState::from_invest(fix.invest);
            match &fix.entity {
                Some(name) => {
                    let index = registry.entity_index(fix.tier, name).ok_or_else(|| {
                        AtjError::unknown_entity(format!("investment_fixes ({})", fix.tier), name)
                    })?;
                    states.tier_mut(fix.tier)[index] = state;
                }
                None => {
                    for slot in states.tier_mut(fix.tier).iter_mut() {
                        *slot = state;
                    }
                }
            }
        }

        Ok(states)
    }

    pub fn tier(&self, tier: Tier) -> &[InvestmentState] {
        match tier {
            Tier::Mill => &self.mills,
            Tier::Airport => &self.airports,
            Tier::Refinery => &self.refineries,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut Vec<InvestmentState> {
        match tier {
            Tier::Mill => &mut self.mills,
            Tier::Airport => &mut self.airports,
            Tier::Refinery => &mut self.refineries,
        }
    }
}

/// The six flow lanes of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    MillToMillEthanol,
    MillToAirportEthanol,
    MillToRefineryEthanol,
    MillToAirportSaf,
    MillToRefinerySaf,
    RefineryToAirportSaf,
}

impl Lane {
    pub const ALL: [Lane; 6] = [
        Lane::MillToMillEthanol,
        Lane::MillToAirportEthanol,
        Lane::MillToRefineryEthanol,
        Lane::MillToAirportSaf,
        Lane::MillToRefinerySaf,
        Lane::RefineryToAirportSaf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::MillToMillEthanol => "mill_to_mill_ethanol",
            Lane::MillToAirportEthanol => "mill_to_airport_ethanol",
            Lane::MillToRefineryEthanol => "mill_to_refinery_ethanol",
            Lane::MillToAirportSaf => "mill_to_airport_saf",
            Lane::MillToRefinerySaf => "mill_to_refinery_saf",
            Lane::RefineryToAirportSaf => "refinery_to_airport_saf",
        }
    }

    pub fn origin(&self) -> Tier {
        match self {
            Lane::RefineryToAirportSaf => Tier::Refinery,
            _ => Tier::Mill,
        }
    }

    pub fn destination(&self) -> Tier {
        match self {
            Lane::MillToMillEthanol => Tier::Mill,
            Lane::MillToAirportEthanol | Lane::MillToAirportSaf | Lane::RefineryToAirportSaf => {
                Tier::Airport
            }
            Lane::MillToRefineryEthanol | Lane::MillToRefinerySaf => Tier::Refinery,
        }
    }

    /// Logistics cost group the lane is charged under.
    pub fn logistics(&self) -> LogisticsLane {
        match self {
            Lane::MillToMillEthanol => LogisticsLane::MillMill,
            Lane::MillToAirportEthanol | Lane::MillToAirportSaf => LogisticsLane::MillAirport,
            Lane::MillToRefineryEthanol | Lane::MillToRefinerySaf => LogisticsLane::MillRefinery,
            Lane::RefineryToAirportSaf => LogisticsLane::RefineryAirport,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Lane::MillToMillEthanol => "eth_mill",
            Lane::MillToAirportEthanol => "eth_air",
            Lane::MillToRefineryEthanol => "eth_ref",
            Lane::MillToAirportSaf => "saf_air",
            Lane::MillToRefinerySaf => "saf_ref",
            Lane::RefineryToAirportSaf => "blend",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four logistics cost groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogisticsLane {
    MillMill,
    MillAirport,
    MillRefinery,
    RefineryAirport,
}

impl LogisticsLane {
    pub const ALL: [LogisticsLane; 4] = [
        LogisticsLane::MillMill,
        LogisticsLane::MillAirport,
        LogisticsLane::MillRefinery,
        LogisticsLane::RefineryAirport,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogisticsLane::MillMill => "mill_mill",
            LogisticsLane::MillAirport => "mill_airport",
            LogisticsLane::MillRefinery => "mill_refinery",
            LogisticsLane::RefineryAirport => "refinery_airport",
        }
    }
}

/// Edge variables of one lane, dense over origin × destination.
///
/// Self-edges of the mill-to-mill lane do not exist.
#[derive(Debug, Clone)]
pub struct FlowLane {
    pub lane: Lane,
    origins: usize,
    destinations: usize,
    vars: Vec<Option<Variable>>,
}

impl FlowLane {
    fn declare(
        problem: &mut ProblemVariables,
        registry: &Registry,
        lane: Lane,
    ) -> Self {
        let origins = registry.num_entities(lane.origin());
        let destinations = registry.num_entities(lane.destination());
        let mut vars = Vec::with_capacity(origins * destinations);
        for o in 0..origins {
            for d in 0..destinations {
                if lane == Lane::MillToMillEthanol && o == d {
                    vars.push(None);
                    continue;
                }
                let name = format!(
                    "{}[{},{}]",
                    lane.prefix(),
                    registry.entity_name(lane.origin(), o),
                    registry.entity_name(lane.destination(), d)
                );
                vars.push(Some(problem.add(variable().min(0.0).name(name))));
            }
        }
        Self {
            lane,
            origins,
            destinations,
            vars,
        }
    }

    pub fn origins(&self) -> usize {
        self.origins
    }

    pub fn destinations(&self) -> usize {
        self.destinations
    }

    pub fn get(&self, origin: usize, destination: usize) -> Option<Variable> {
        self.vars[origin * self.destinations + destination]
    }

    /// Edges leaving `origin`.
    pub fn outgoing(&self, origin: usize) -> impl Iterator<Item = (usize, Variable)> + '_ {
        (0..self.destinations).filter_map(move |d| self.get(origin, d).map(|v| (d, v)))
    }

    /// Edges entering `destination`.
    pub fn incoming(&self, destination: usize) -> impl Iterator<Item = (usize, Variable)> + '_ {
        (0..self.origins).filter_map(move |o| self.get(o, destination).map(|v| (o, v)))
    }

    /// Every existing edge as `(origin, destination, variable)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, Variable)> + '_ {
        (0..self.origins).flat_map(move |o| {
            (0..self.destinations).filter_map(move |d| self.get(o, d).map(|v| (o, d, v)))
        })
    }

    pub fn len(&self) -> usize {
        self.vars.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-tier production, investment and piecewise variables.
#[derive(Debug, Clone)]
pub struct TierVariables {
    pub tier: Tier,
    production: Vec<Vec<Variable>>,
    /// Investment binary per entity (`y`, `z`, `y_ref`)
    pub invest: Vec<Variable>,
    /// Interval weights `w[e][k]`, `k < N-1`
    pub weights: Vec<Vec<Variable>>,
    /// Activation binaries `a[e][k]`, `k < N-2`
    pub activations: Vec<Vec<Variable>>,
}

impl TierVariables {
    pub fn get(&self, entity: usize, product: Product) -> Variable {
        self.production[entity][product.index()]
    }

    pub fn len(&self) -> usize {
        self.production.len()
    }

    pub fn is_empty(&self) -> bool {
        self.production.is_empty()
    }
}

/// Purchases on the external market.
#[derive(Debug, Clone, Copy)]
pub struct Purchases {
    pub sugar: Variable,
    pub corn_ethanol: Variable,
    pub jet_fuel: Variable,
    pub gasoline: Variable,
}

/// Variable totals by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariableCounts {
    pub production: usize,
    pub flows: usize,
    pub binaries: usize,
    pub piecewise_weights: usize,
    pub purchases: usize,
    pub incentives: usize,
}

impl VariableCounts {
    pub fn total(&self) -> usize {
        self.production
            + self.flows
            + self.binaries
            + self.piecewise_weights
            + self.purchases
            + self.incentives
    }

    pub fn continuous(&self) -> usize {
        self.total() - self.binaries
    }
}

/// Every decision variable of the model.
#[derive(Debug, Clone)]
pub struct VariableRegistry {
    pub mills: TierVariables,
    pub airports: TierVariables,
    pub refineries: TierVariables,
    lanes: Vec<FlowLane>,
    pub purchases: Purchases,
    /// Incentive payment per mill (`s`)
    pub incentives: Vec<Variable>,
    pub counts: VariableCounts,
}

impl VariableRegistry {
    pub fn declare(
        problem: &mut ProblemVariables,
        registry: &Registry,
        policy: &Policy,
        states: &InvestmentStates,
    ) -> Self {
        let mut counts = VariableCounts::default();

        let mills = declare_tier(problem, registry, policy, states, Tier::Mill, &mut counts);
        let airports = declare_tier(problem, registry, policy, states, Tier::Airport, &mut counts);
        let refineries =
            declare_tier(problem, registry, policy, states, Tier::Refinery, &mut counts);

        let lanes: Vec<FlowLane> = Lane::ALL
            .iter()
            .map(|&lane| FlowLane::declare(problem, registry, lane))
            .collect();
        counts.flows = lanes.iter().map(FlowLane::len).sum();

        let purchases = Purchases {
            sugar: problem.add(variable().min(0.0).name("p[sug]")),
            corn_ethanol: problem.add(variable().min(0.0).name("p[et]")),
            jet_fuel: problem.add(variable().min(0.0).name("p[f]")),
            gasoline: problem.add(variable().min(0.0).name("p[g]")),
        };
        counts.purchases = 4;

        let incentives: Vec<Variable> = registry
            .mill_names()
            .map(|name| {
                let def = if policy.incentives {
                    variable().min(0.0)
                } else {
                    variable().min(0.0).max(0.0)
                };
                problem.add(def.name(format!("s[{}]", name)))
            })
            .collect();
        counts.incentives = incentives.len();

        Self {
            mills,
            airports,
            refineries,
            lanes,
            purchases,
            incentives,
            counts,
        }
    }

    pub fn tier(&self, tier: Tier) -> &TierVariables {
        match tier {
            Tier::Mill => &self.mills,
            Tier::Airport => &self.airports,
            Tier::Refinery => &self.refineries,
        }
    }

    pub fn lane(&self, lane: Lane) -> &FlowLane {
        &self.lanes[lane as usize]
    }

    pub fn lanes(&self) -> impl Iterator<Item = &FlowLane> {
        self.lanes.iter()
    }
}

fn tier_prefix(tier: Tier) -> (&'static str, &'static str) {
    match tier {
        Tier::Mill => ("x", "y"),
        Tier::Airport => ("v", "z"),
        Tier::Refinery => ("x_ref", "y_ref"),
    }
}

/// Whether a fixed investment state closes this (tier, product) trade term.
fn pinned_by_state(tier: Tier, product: Product, state: InvestmentState) -> bool {
    match (tier, state) {
        (_, InvestmentState::Undecided) => false,
        (Tier::Mill, InvestmentState::Producer) => product == Product::EthanolPurchased,
        (Tier::Mill, InvestmentState::Converter) => matches!(
            product,
            Product::EthanolToMills | Product::EthanolToAirports | Product::EthanolToRefineries
        ),
        (_, InvestmentState::Producer) => product == Product::Ethanol,
        (_, InvestmentState::Converter) => false,
    }
}

fn declare_tier(
    problem: &mut ProblemVariables,
    registry: &Registry,
    policy: &Policy,
    states: &InvestmentStates,
    tier: Tier,
    counts: &mut VariableCounts,
) -> TierVariables {
    let (x, y) = tier_prefix(tier);
    let tier_states = states.tier(tier);
    let n = registry.num_entities(tier);
    let intervals = policy.breakpoints.saturating_sub(1);
    let activations_per = policy.breakpoints.saturating_sub(2);

    let mut production = Vec::with_capacity(n);
    let mut invest = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    let mut activations = Vec::with_capacity(n);

    for e in 0..n {
        let name = registry.entity_name(tier, e);
        let state = tier_states[e];

        let row: Vec<Variable> = Product::ALL
            .iter()
            .map(|&product| {
                let def = if !tier_uses(tier, product) || pinned_by_state(tier, product, state) {
                    variable().min(0.0).max(0.0)
                } else {
                    variable().min(0.0)
                };
                problem.add(def.name(format!("{}[{},{}]", x, name, product.code())))
            })
            .collect();
        production.push(row);

        let binary = match state.fixed_value() {
            Some(v) => variable().binary().min(v).max(v),
            None => variable().binary(),
        };
        invest.push(problem.add(binary.name(format!("{}[{}]", y, name))));

        weights.push(
            (0..intervals)
                .map(|k| {
                    problem.add(
                        variable()
                            .min(0.0)
                            .max(1.0)
                            .name(format!("w_{}[{},{}]", tier, name, k)),
                    )
                })
                .collect(),
        );
        activations.push(
            (0..activations_per)
                .map(|k| {
                    problem.add(
                        variable()
                            .binary()
                            .name(format!("a_{}[{},{}]", tier, name, k)),
                    )
                })
                .collect(),
        );
    }

    counts.production += n * Product::COUNT;
    counts.binaries += n * (1 + activations_per);
    counts.piecewise_weights += n * intervals;

    TierVariables {
        tier,
        production,
        invest,
        weights,
        activations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sc_model::params::InvestmentFix;
    use crate::test_utils::small_case;

    #[test]
    fn test_tier_usage() {
        assert!(tier_uses(Tier::Mill, Product::Juice));
        assert!(!tier_uses(Tier::Mill, Product::BlendedSaf));
        assert!(!tier_uses(Tier::Airport, Product::Sugar));
        assert!(tier_uses(Tier::Refinery, Product::SafToRefineries));
    }

    #[test]
    fn test_investment_fixes_apply_in_order() {
        let registry = Registry::resolve(&small_case()).unwrap();
        let policy = Policy::default()
            .fix_investment(InvestmentFix::tier(Tier::Mill, false))
            .fix_investment(InvestmentFix::entity(Tier::Mill, "Usina B", true));
        let states = InvestmentStates::resolve(&registry, &policy).unwrap();
        assert_eq!(
            states.mills,
            vec![InvestmentState::Producer, InvestmentState::Converter]
        );
        assert_eq!(states.airports, vec![InvestmentState::Undecided]);
    }

    #[test]
    fn test_unknown_fix_target_rejected() {
        let registry = Registry::resolve(&small_case()).unwrap();
        let policy =
            Policy::default().fix_investment(InvestmentFix::entity(Tier::Airport, "CGH", true));
        let err = InvestmentStates::resolve(&registry, &policy).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("CGH"));
    }

    #[test]
    fn test_declared_counts() {
        let registry = Registry::resolve(&small_case()).unwrap();
        let policy = Policy::new(0.2, 400.0).with_breakpoints(3);
        let states = InvestmentStates::resolve(&registry, &policy).unwrap();
        let mut problem = ProblemVariables::new();
        let vars = VariableRegistry::declare(&mut problem, &registry, &policy, &states);

        // 2 mills, 1 airport, 1 refinery
        assert_eq!(vars.counts.production, 4 * Product::COUNT);
        // mill-mill 2, then 2 + 2 + 2 + 2 + 1
        assert_eq!(vars.counts.flows, 11);
        assert_eq!(vars.lane(Lane::MillToMillEthanol).get(0, 0), None);
        assert_eq!(vars.lane(Lane::RefineryToAirportSaf).len(), 1);
        // one investment binary plus one activation per entity
        assert_eq!(vars.counts.binaries, 8);
        assert_eq!(vars.counts.piecewise_weights, 8);
        assert_eq!(vars.counts.total(), problem.len());
    }

    #[test]
    fn test_lane_metadata() {
        assert_eq!(Lane::MillToRefinerySaf.destination(), Tier::Refinery);
        assert_eq!(Lane::RefineryToAirportSaf.origin(), Tier::Refinery);
        assert_eq!(Lane::MillToAirportSaf.logistics(), LogisticsLane::MillAirport);
        assert_eq!(LogisticsLane::RefineryAirport.index(), 3);
    }
}
