//! Objective assembly
//!
//! Both objectives are built from the same per-entity sub-expressions, which
//! stay attached to the model so a solution can evaluate them afterwards.
//!
//! ```text
//! OPEX_i      = cost_sug·sug + cost_et·et + cost_saf·saf + cost_el·el
//! OPEX_site   = greenfield_opex·saf
//! REV_i       = price_sug·sug + price_et·etmk + (price_et + eth_prem)·(etref + etr)
//!             + price_el·el + (price_saf + saf_prem)·saf
//! LOG_lane    = Σ_edges (rate·km + fixed)·flow
//! PROFIT_i    = REV_i + s_i - OPEX_i - price_et·etpc_i - CAPEX_i - LOG_i ≥ 0
//!
//! profit mode   max  Σ REV - Σ OPEX - Σ price_et·etpc - Σ LOG_lane - Σ CAPEX
//! cost mode     min  Σ OPEX + Σ LOG_lane + Σ CAPEX + external purchases + Σ s
//! ```
//!
//! Mill-to-mill logistics is charged to the buying mill. Ethanol shipped to
//! airports (`eta`) earns the mill nothing; only its logistics is charged.

use std::fmt;

use atj_core::{Product, Tier};
use good_lp::{constraint, Expression};

use super::capex::capex_expression;
use super::model::{BuildContext, ConstraintFamily, ConstraintSet, TierCurves};
use super::params::ObjectiveMode;
use super::registry::Registry;
use super::variables::{Lane, LogisticsLane};

/// Per-mill economic sub-expressions.
#[derive(Clone)]
pub struct MillExpressions {
    pub revenue: Expression,
    pub opex: Expression,
    pub capex: Expression,
    /// Inbound mill-to-mill plus outbound airport and refinery shipments
    pub logistics: Expression,
    pub ethanol_purchase: Expression,
    pub incentive: Expression,
    pub profit: Expression,
}

/// Greenfield (airport or refinery) sub-expressions.
#[derive(Clone)]
pub struct SiteExpressions {
    pub opex: Expression,
    pub capex: Expression,
}

#[derive(Clone)]
pub struct ModelExpressions {
    pub mills: Vec<MillExpressions>,
    pub airports: Vec<SiteExpressions>,
    pub refineries: Vec<SiteExpressions>,
    /// Indexed by [`LogisticsLane::index`]
    pub lane_logistics: Vec<Expression>,
    pub external_purchase: Expression,
    pub incentives: Expression,
    pub revenue: Expression,
    pub opex: Expression,
    pub capex: Expression,
    pub ethanol_purchase: Expression,
    pub logistics: Expression,
    pub profit: Expression,
    pub cost: Expression,
}

/// Shipping distance of one lane edge.
pub(crate) fn lane_distance(registry: &Registry, lane: Lane, origin: usize, destination: usize) -> f64 {
    let d = &registry.distances;
    match lane {
        Lane::MillToMillEthanol => d.mill_mill[origin][destination],
        Lane::MillToAirportEthanol | Lane::MillToAirportSaf => d.mill_airport[origin][destination],
        Lane::MillToRefineryEthanol | Lane::MillToRefinerySaf => {
            d.mill_refinery[origin][destination]
        }
        Lane::RefineryToAirportSaf => d.refinery_airport[origin][destination],
    }
}

impl ModelExpressions {
    pub(crate) fn assemble(ctx: &BuildContext<'_>, curves: &TierCurves) -> Self {
        let registry = ctx.registry;
        let policy = ctx.policy;
        let market = ctx.market;
        let prices = &registry.prices;
        let vars = ctx.vars;

        // Lane totals and per-mill shares in one pass over the edges
        let mut lane_logistics = vec![Expression::from(0.0); LogisticsLane::ALL.len()];
        let mut mill_logistics = vec![Expression::from(0.0); registry.num_mills()];
        for lane in vars.lanes() {
            for (o, d, flow) in lane.edges() {
                let unit = market.unit_logistics_cost(lane_distance(registry, lane.lane, o, d));
                lane_logistics[lane.lane.logistics().index()] += unit * flow;
                match lane.lane.origin() {
                    Tier::Mill if lane.lane == Lane::MillToMillEthanol => {
                        mill_logistics[d] += unit * flow
                    }
                    Tier::Mill => mill_logistics[o] += unit * flow,
                    _ => {}
                }
            }
        }

        let x = &vars.mills;
        let mut mills = Vec::with_capacity(registry.num_mills());
        for (i, logistics) in mill_logistics.into_iter().enumerate() {
            let v = |p: Product| x.get(i, p);

            let revenue = prices.sugar * v(Product::Sugar)
                + prices.ethanol * v(Product::EthanolMarket)
                + (prices.ethanol + policy.eth_premium)
                    * (v(Product::EthanolToMills) + v(Product::EthanolToRefineries))
                + prices.electricity * v(Product::Electricity)
                + (prices.saf + policy.saf_premium) * v(Product::Saf);
            let opex = prices.sugar_cost * v(Product::Sugar)
                + prices.ethanol_cost * v(Product::Ethanol)
                + prices.saf_cost * v(Product::Saf)
                + prices.electricity_cost * v(Product::Electricity);
            let capex = capex_expression(&curves.mill, x, i);
            let ethanol_purchase = prices.ethanol * v(Product::EthanolPurchased);
            let incentive = Expression::from(vars.incentives[i]);
            let profit = revenue.clone() + incentive.clone()
                - opex.clone()
                - ethanol_purchase.clone()
                - capex.clone()
                - logistics.clone();

            mills.push(MillExpressions {
                revenue,
                opex,
                capex,
                logistics,
                ethanol_purchase,
                incentive,
                profit,
            });
        }

        let sites = |tier: Tier| -> Vec<SiteExpressions> {
            let tier_vars = vars.tier(tier);
            let rate = market.greenfield_opex(tier);
            (0..tier_vars.len())
                .map(|e| SiteExpressions {
                    opex: rate * tier_vars.get(e, Product::Saf),
                    capex: capex_expression(curves.tier(tier), tier_vars, e),
                })
                .collect()
        };
        let airports = sites(Tier::Airport);
        let refineries = sites(Tier::Refinery);

        let p = &vars.purchases;
        let external_purchase = prices.sugar * p.sugar
            + prices.saf * p.jet_fuel
            + prices.ethanol * p.corn_ethanol
            + prices.gasoline * p.gasoline;

        let mut incentives = Expression::from(0.0);
        let mut revenue = Expression::from(0.0);
        let mut opex = Expression::from(0.0);
        let mut capex = Expression::from(0.0);
        let mut ethanol_purchase = Expression::from(0.0);
        for m in &mills {
            incentives += m.incentive.clone();
            revenue += m.revenue.clone();
            opex += m.opex.clone();
            capex += m.capex.clone();
            ethanol_purchase += m.ethanol_purchase.clone();
        }
        for site in airports.iter().chain(refineries.iter()) {
            opex += site.opex.clone();
            capex += site.capex.clone();
        }
        let mut logistics = Expression::from(0.0);
        for lane in &lane_logistics {
            logistics += lane.clone();
        }

        let profit = revenue.clone()
            - opex.clone()
            - ethanol_purchase.clone()
            - logistics.clone()
            - capex.clone();
        let cost = opex.clone()
            + logistics.clone()
            + capex.clone()
            + external_purchase.clone()
            + incentives.clone();

        Self {
            mills,
            airports,
            refineries,
            lane_logistics,
            external_purchase,
            incentives,
            revenue,
            opex,
            capex,
            ethanol_purchase,
            logistics,
            profit,
            cost,
        }
    }

    pub fn objective(&self, mode: ObjectiveMode) -> Expression {
        match mode {
            ObjectiveMode::Profit => self.profit.clone(),
            ObjectiveMode::Cost => self.cost.clone(),
        }
    }

    pub fn lane(&self, lane: LogisticsLane) -> &Expression {
        &self.lane_logistics[lane.index()]
    }
}

impl fmt::Debug for ModelExpressions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelExpressions")
            .field("mills", &self.mills.len())
            .field("airports", &self.airports.len())
            .field("refineries", &self.refineries.len())
            .finish_non_exhaustive()
    }
}

/// Every mill must break even on its own.
pub(crate) fn add_profitability(expressions: &ModelExpressions, out: &mut ConstraintSet) {
    for mill in &expressions.mills {
        out.push(
            ConstraintFamily::Profitability,
            constraint!(mill.profit.clone() >= 0.0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sc_model::SupplyChainModel;
    use crate::test_utils::{small_case, small_market, small_policy};

    #[test]
    fn test_one_profitability_row_per_mill() {
        let model =
            SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market()).unwrap();
        assert_eq!(
            model.stats().constraints_by_family[&ConstraintFamily::Profitability],
            2
        );
        assert_eq!(model.expressions().mills.len(), 2);
        assert_eq!(model.expressions().lane_logistics.len(), 4);
    }

    #[test]
    fn test_premium_only_on_mill_and_refinery_ethanol() {
        use std::collections::HashMap;

        let policy = small_policy(0.2).with_premiums(0.0, 0.5);
        let model = SupplyChainModel::build(&small_case(), &policy, &small_market()).unwrap();
        let mills = &model.variables().mills;
        let revenue = &model.expressions().mills[0].revenue;
        let per_unit = |product: Product| {
            let mut values: HashMap<good_lp::Variable, f64> = HashMap::new();
            values.insert(mills.get(0, product), 1.0);
            revenue.eval_with(&values)
        };

        assert_eq!(per_unit(Product::EthanolToAirports), 0.0);
        assert!((per_unit(Product::EthanolToRefineries) - 3.5).abs() < 1e-9);
        assert!((per_unit(Product::EthanolToMills) - 3.5).abs() < 1e-9);
        assert!((per_unit(Product::EthanolMarket) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lane_distance_lookup() {
        let registry = Registry::resolve(&small_case()).unwrap();
        assert_eq!(lane_distance(&registry, Lane::MillToMillEthanol, 0, 1), 50.0);
        assert_eq!(lane_distance(&registry, Lane::RefineryToAirportSaf, 0, 0), 50.0);
    }
}
