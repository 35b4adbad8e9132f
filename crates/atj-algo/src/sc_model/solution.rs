//! Solved model results
//!
//! Extraction reads every declared variable once, clamps flows and
//! production to be nonnegative and evaluates the economic sub-expressions
//! the objective was built from. Deciding what counts as "no flow" is left to
//! the caller through an explicit threshold.

use atj_core::{MillKind, Product, Tier};
use good_lp::Solution;
use indexmap::IndexMap;
use serde::Serialize;

use super::model::ModelLayout;
use super::params::{BlendingPolicy, ObjectiveMode};
use super::variables::{Lane, LogisticsLane, TierVariables};

/// Conventional "no flow" threshold.
pub const FLOW_EPSILON: f64 = 1e-6;

/// Volumes shipped on one lane, dense over origin × destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowMatrix {
    pub lane: Lane,
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl FlowMatrix {
    pub fn get(&self, origin: usize, destination: usize) -> f64 {
        self.values[origin][destination]
    }

    /// Volume between two named entities.
    pub fn value(&self, origin: &str, destination: &str) -> Option<f64> {
        let o = self.origins.iter().position(|n| n == origin)?;
        let d = self.destinations.iter().position(|n| n == destination)?;
        Some(self.values[o][d])
    }

    /// `true` where the volume exceeds `threshold`.
    pub fn connections(&self, threshold: f64) -> Vec<Vec<bool>> {
        self.values
            .iter()
            .map(|row| row.iter().map(|v| *v > threshold).collect())
            .collect()
    }

    /// Copy with every volume at or below `threshold` set to zero.
    pub fn thresholded(&self, threshold: f64) -> FlowMatrix {
        FlowMatrix {
            values: self
                .values
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|v| if *v > threshold { *v } else { 0.0 })
                        .collect()
                })
                .collect(),
            ..self.clone()
        }
    }

    /// Edges carrying more than `threshold`, as `(origin, destination, volume)`.
    pub fn active_edges(&self, threshold: f64) -> Vec<(&str, &str, f64)> {
        let mut edges = Vec::new();
        for (o, row) in self.values.iter().enumerate() {
            for (d, v) in row.iter().enumerate() {
                if *v > threshold {
                    edges.push((self.origins[o].as_str(), self.destinations[d].as_str(), *v));
                }
            }
        }
        edges
    }

    pub fn total(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    pub fn incoming(&self, destination: usize) -> f64 {
        self.values.iter().map(|row| row[destination]).sum()
    }

    pub fn outgoing(&self, origin: usize) -> f64 {
        self.values[origin].iter().sum()
    }
}

/// Key results of one mill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MillResult {
    pub kind: MillKind,
    pub invest: bool,
    /// Production by product code
    pub production: IndexMap<String, f64>,
    pub piecewise_weights: Vec<f64>,
    pub revenue: f64,
    pub opex: f64,
    pub capex: f64,
    pub logistics: f64,
    pub ethanol_purchase: f64,
    pub incentive: f64,
    pub profit: f64,
}

impl MillResult {
    pub fn get(&self, product: Product) -> f64 {
        self.production.get(product.code()).copied().unwrap_or(0.0)
    }
}

/// Key results of one airport or refinery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteResult {
    pub invest: bool,
    pub production: IndexMap<String, f64>,
    pub piecewise_weights: Vec<f64>,
    pub opex: f64,
    pub capex: f64,
}

impl SiteResult {
    pub fn get(&self, product: Product) -> f64 {
        self.production.get(product.code()).copied().unwrap_or(0.0)
    }
}

/// Quantities bought on the external market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurchaseResult {
    pub sugar: f64,
    pub corn_ethanol: f64,
    pub jet_fuel: f64,
    pub gasoline: f64,
}

/// Everything a caller needs from an optimal solve.
#[derive(Debug, Clone, Serialize)]
pub struct SupplyChainSolution {
    pub objective: ObjectiveMode,
    pub objective_value: f64,
    pub total_profit: f64,
    pub total_cost: f64,
    pub revenue: f64,
    pub opex: f64,
    pub capex: f64,
    pub ethanol_purchase: f64,
    /// Logistics cost by lane group
    pub logistics: IndexMap<String, f64>,
    pub external_purchase_cost: f64,
    pub incentives: f64,
    pub purchases: PurchaseResult,
    pub mills: IndexMap<String, MillResult>,
    pub airports: IndexMap<String, SiteResult>,
    pub refineries: IndexMap<String, SiteResult>,
    /// SAF counted toward each airport's blend mandate
    pub saf_delivered: IndexMap<String, f64>,
    pub flows: Vec<FlowMatrix>,
}

fn clamp(value: f64) -> f64 {
    value.max(0.0)
}

fn production<S: Solution>(vars: &TierVariables, e: usize, solution: &S) -> IndexMap<String, f64> {
    Product::ALL
        .iter()
        .map(|&p| (p.code().to_string(), clamp(solution.value(vars.get(e, p)))))
        .collect()
}

fn weights<S: Solution>(vars: &TierVariables, e: usize, solution: &S) -> Vec<f64> {
    vars.weights[e].iter().map(|w| solution.value(*w)).collect()
}

impl SupplyChainSolution {
    pub fn extract<S: Solution>(layout: &ModelLayout, solution: &S) -> Self {
        let registry = &layout.registry;
        let vars = &layout.vars;
        let exprs = &layout.expressions;

        let mills = registry
            .mills
            .iter()
            .enumerate()
            .map(|(i, (name, entry))| {
                let e = &exprs.mills[i];
                let result = MillResult {
                    kind: entry.kind,
                    invest: solution.value(vars.mills.invest[i]) > 0.5,
                    production: production(&vars.mills, i, solution),
                    piecewise_weights: weights(&vars.mills, i, solution),
                    revenue: e.revenue.eval_with(solution),
                    opex: e.opex.eval_with(solution),
                    capex: e.capex.eval_with(solution),
                    logistics: e.logistics.eval_with(solution),
                    ethanol_purchase: e.ethanol_purchase.eval_with(solution),
                    incentive: e.incentive.eval_with(solution),
                    profit: e.profit.eval_with(solution),
                };
                (name.clone(), result)
            })
            .collect();

        let sites = |tier: Tier| -> IndexMap<String, SiteResult> {
            let tier_vars = vars.tier(tier);
            let tier_exprs = match tier {
                Tier::Airport => &exprs.airports,
                _ => &exprs.refineries,
            };
            (0..tier_vars.len())
                .map(|e| {
                    let result = SiteResult {
                        invest: solution.value(tier_vars.invest[e]) > 0.5,
                        production: production(tier_vars, e, solution),
                        piecewise_weights: weights(tier_vars, e, solution),
                        opex: tier_exprs[e].opex.eval_with(solution),
                        capex: tier_exprs[e].capex.eval_with(solution),
                    };
                    (registry.entity_name(tier, e).to_string(), result)
                })
                .collect()
        };
        let airports = sites(Tier::Airport);
        let refineries = sites(Tier::Refinery);

        let flows: Vec<FlowMatrix> = vars
            .lanes()
            .map(|lane| {
                let origin = lane.lane.origin();
                let destination = lane.lane.destination();
                FlowMatrix {
                    lane: lane.lane,
                    origins: (0..lane.origins())
                        .map(|o| registry.entity_name(origin, o).to_string())
                        .collect(),
                    destinations: (0..lane.destinations())
                        .map(|d| registry.entity_name(destination, d).to_string())
                        .collect(),
                    values: (0..lane.origins())
                        .map(|o| {
                            (0..lane.destinations())
                                .map(|d| {
                                    lane.get(o, d)
                                        .map(|v| clamp(solution.value(v)))
                                        .unwrap_or(0.0)
                                })
                                .collect()
                        })
                        .collect(),
                }
            })
            .collect();

        let blended = &flows[Lane::RefineryToAirportSaf as usize];
        let direct = &flows[Lane::MillToAirportSaf as usize];
        let saf_delivered = airports
            .iter()
            .enumerate()
            .map(|(a, (name, site))| {
                let mut delivered = blended.incoming(a);
                if layout.policy.blending == BlendingPolicy::AirportOrRefinery {
                    delivered += direct.incoming(a) + site.get(Product::Saf);
                }
                (name.clone(), delivered)
            })
            .collect();

        let logistics = LogisticsLane::ALL
            .iter()
            .map(|lane| {
                (
                    lane.as_str().to_string(),
                    exprs.lane(*lane).eval_with(solution),
                )
            })
            .collect();

        let p = &vars.purchases;
        let purchases = PurchaseResult {
            sugar: clamp(solution.value(p.sugar)),
            corn_ethanol: clamp(solution.value(p.corn_ethanol)),
            jet_fuel: clamp(solution.value(p.jet_fuel)),
            gasoline: clamp(solution.value(p.gasoline)),
        };

        let objective = layout.policy.objective;
        Self {
            objective,
            objective_value: exprs.objective(objective).eval_with(solution),
            total_profit: exprs.profit.eval_with(solution),
            total_cost: exprs.cost.eval_with(solution),
            revenue: exprs.revenue.eval_with(solution),
            opex: exprs.opex.eval_with(solution),
            capex: exprs.capex.eval_with(solution),
            ethanol_purchase: exprs.ethanol_purchase.eval_with(solution),
            logistics,
            external_purchase_cost: exprs.external_purchase.eval_with(solution),
            incentives: exprs.incentives.eval_with(solution),
            purchases,
            mills,
            airports,
            refineries,
            saf_delivered,
            flows,
        }
    }

    pub fn flow(&self, lane: Lane) -> &FlowMatrix {
        &self.flows[lane as usize]
    }

    pub fn total_logistics(&self) -> f64 {
        self.logistics.values().sum()
    }

    pub fn total_saf_delivered(&self) -> f64 {
        self.saf_delivered.values().sum()
    }

    /// SAF produced at every node of every tier.
    pub fn total_saf_produced(&self) -> f64 {
        self.mills.values().map(|m| m.get(Product::Saf)).sum::<f64>()
            + self
                .airports
                .values()
                .chain(self.refineries.values())
                .map(|s| s.get(Product::Saf))
                .sum::<f64>()
    }

    /// Ethanol sold by mills to the fuel market.
    pub fn ethanol_market(&self) -> f64 {
        self.mills.values().map(|m| m.get(Product::EthanolMarket)).sum()
    }

    /// Entities that build SAF capacity.
    pub fn investors(&self) -> Vec<(Tier, &str)> {
        let mut out: Vec<(Tier, &str)> = self
            .mills
            .iter()
            .filter(|(_, m)| m.invest)
            .map(|(n, _)| (Tier::Mill, n.as_str()))
            .collect();
        for (tier, sites) in [(Tier::Airport, &self.airports), (Tier::Refinery, &self.refineries)] {
            out.extend(
                sites
                    .iter()
                    .filter(|(_, s)| s.invest)
                    .map(|(n, _)| (tier, n.as_str())),
            );
        }
        out
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Supply Chain Solution\n{}\n", "=".repeat(40)));
        s.push_str(&format!(
            "Objective ({}): {:.2}\n",
            self.objective, self.objective_value
        ));
        s.push_str(&format!("Total Profit: {:.2}\n", self.total_profit));
        s.push_str(&format!("Total Cost: {:.2}\n", self.total_cost));
        s.push_str(&format!("  Revenue: {:.2}\n", self.revenue));
        s.push_str(&format!("  OPEX: {:.2}\n", self.opex));
        s.push_str(&format!("  CAPEX: {:.2}\n", self.capex));
        s.push_str(&format!("  Logistics: {:.2}\n", self.total_logistics()));
        s.push_str(&format!(
            "  External purchases: {:.2}\n",
            self.external_purchase_cost
        ));
        s.push_str(&format!(
            "SAF delivered: {:.2} m3 (produced {:.2})\n",
            self.total_saf_delivered(),
            self.total_saf_produced()
        ));
        s.push_str(&format!("Jet fuel purchased: {:.2} m3\n", self.purchases.jet_fuel));

        let investors = self.investors();
        if !investors.is_empty() {
            s.push_str("\nSAF Investments:\n");
            for (tier, name) in investors {
                s.push_str(&format!("  [BUILD] {} {}\n", tier, name));
            }
        }

        s
    }
}
