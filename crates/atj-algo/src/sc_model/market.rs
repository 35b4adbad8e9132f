//! Market and flow constraints
//!
//! ```text
//! Lane balances      sold[o] = Σ_d f[o,d]        bought[d] = Σ_o f[o,d]
//! Sell-or-buy        etref, eta, etr ≤ (1 - y)·M_sell(i)     etpc ≤ y·M_buy
//!                    airport/refinery et ≤ z·M_buy
//! Investment size    y·min_size ≤ saf ≤ y·max_cap
//! Demand             Σ saf_air + Σ blend + v[a,saf] = D_a·blend
//! Jet fuel           p_jet = Σ_a D_a·(1 - blend)
//! Sugar              Σ sug + p_sug ≥ sugar_demand
//! Ground energy      (p_et + Σ etmk)·e_eth + (p_g + Σ g)·e_gas ≥ ground_demand
//! Corn ethanol       p_et ≤ corn_cap
//! ```
//!
//! Sell-or-buy rows are written only for `Undecided` entities. A fixed
//! investment state already pins the excluded terms through variable bounds.

use atj_core::{Product, Tier};
use good_lp::{constraint, Expression, Variable};

use super::model::{BuildContext, ConstraintFamily, ConstraintSet};
use super::params::{BlendingPolicy, InvestmentState};
use super::variables::{FlowLane, Lane};

fn sum<I: IntoIterator<Item = Variable>>(vars: I) -> Expression {
    let mut total = Expression::from(0.0);
    for v in vars {
        total += v;
    }
    total
}

fn outgoing(lane: &FlowLane, origin: usize) -> Expression {
    sum(lane.outgoing(origin).map(|(_, v)| v))
}

fn incoming(lane: &FlowLane, destination: usize) -> Expression {
    sum(lane.incoming(destination).map(|(_, v)| v))
}

/// Tie per-entity sold/bought quantities to the edge variables of each lane.
pub(crate) fn add_lane_balances(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let vars = ctx.vars;
    let mills = &vars.mills;
    let airports = &vars.airports;
    let refineries = &vars.refineries;

    let mill_mill = vars.lane(Lane::MillToMillEthanol);
    let mill_air_et = vars.lane(Lane::MillToAirportEthanol);
    let mill_ref_et = vars.lane(Lane::MillToRefineryEthanol);
    let mill_air_saf = vars.lane(Lane::MillToAirportSaf);
    let mill_ref_saf = vars.lane(Lane::MillToRefinerySaf);
    let ref_air = vars.lane(Lane::RefineryToAirportSaf);

    for i in 0..mills.len() {
        let sold = [
            (Product::EthanolToMills, mill_mill),
            (Product::EthanolToAirports, mill_air_et),
            (Product::EthanolToRefineries, mill_ref_et),
            (Product::SafToAirports, mill_air_saf),
            (Product::SafToRefineries, mill_ref_saf),
        ];
        for (product, lane) in sold {
            out.push(
                ConstraintFamily::LaneBalance,
                constraint!(mills.get(i, product) == outgoing(lane, i)),
            );
        }
        out.push(
            ConstraintFamily::LaneBalance,
            constraint!(mills.get(i, Product::EthanolPurchased) == incoming(mill_mill, i)),
        );
    }

    for a in 0..airports.len() {
        out.push(
            ConstraintFamily::LaneBalance,
            constraint!(airports.get(a, Product::Ethanol) == incoming(mill_air_et, a)),
        );
    }

    for r in 0..refineries.len() {
        out.push(
            ConstraintFamily::LaneBalance,
            constraint!(refineries.get(r, Product::Ethanol) == incoming(mill_ref_et, r)),
        );
        out.push(
            ConstraintFamily::LaneBalance,
            constraint!(refineries.get(r, Product::SafToRefineries) == incoming(mill_ref_saf, r)),
        );
        out.push(
            ConstraintFamily::LaneBalance,
            constraint!(refineries.get(r, Product::BlendedSaf) == outgoing(ref_air, r)),
        );
    }
}

/// Big-M sell-or-buy disjunctions for entities whose investment is undecided.
pub(crate) fn add_disjunctions(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let registry = ctx.registry;
    let m_buy = ctx
        .market
        .big_m
        .unwrap_or_else(|| registry.network_ethanol_potential());

    let mills = &ctx.vars.mills;
    for (i, state) in ctx.states.mills.iter().enumerate() {
        if *state != InvestmentState::Undecided {
            continue;
        }
        let m_sell = ctx
            .market
            .big_m
            .unwrap_or_else(|| registry.ethanol_potential(i));
        let y = mills.invest[i];
        for product in [
            Product::EthanolToMills,
            Product::EthanolToAirports,
            Product::EthanolToRefineries,
        ] {
            out.push(
                ConstraintFamily::Disjunction,
                constraint!(mills.get(i, product) + m_sell * y <= m_sell),
            );
        }
        out.push(
            ConstraintFamily::Disjunction,
            constraint!(mills.get(i, Product::EthanolPurchased) <= m_buy * y),
        );
    }

    for tier in [Tier::Airport, Tier::Refinery] {
        let vars = ctx.vars.tier(tier);
        for (e, state) in ctx.states.tier(tier).iter().enumerate() {
            if *state != InvestmentState::Undecided {
                continue;
            }
            let z = vars.invest[e];
            out.push(
                ConstraintFamily::Disjunction,
                constraint!(vars.get(e, Product::Ethanol) <= m_buy * z),
            );
        }
    }
}

/// SAF output lies between the tier's minimum size and the capacity cap
/// when the entity invests, and is zero otherwise.
pub(crate) fn add_investment_bounds(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let max_cap = ctx.policy.max_saf_capacity;
    for tier in Tier::ALL {
        let min_size = ctx.market.min_saf_size(tier);
        let vars = ctx.vars.tier(tier);
        for e in 0..vars.len() {
            let saf = vars.get(e, Product::Saf);
            let y = vars.invest[e];
            out.push(
                ConstraintFamily::InvestmentBounds,
                constraint!(saf <= max_cap * y),
            );
            out.push(
                ConstraintFamily::InvestmentBounds,
                constraint!(saf >= min_size * y),
            );
        }
    }
}

/// SAF delivered to airport `a` under the active blending policy.
pub(crate) fn delivered_saf(ctx: &BuildContext<'_>, a: usize) -> Expression {
    let vars = ctx.vars;
    let mut delivered = incoming(vars.lane(Lane::RefineryToAirportSaf), a);
    if ctx.policy.blending == BlendingPolicy::AirportOrRefinery {
        delivered += incoming(vars.lane(Lane::MillToAirportSaf), a);
        delivered += vars.airports.get(a, Product::Saf);
    }
    delivered
}

/// Blend mandate at every airport plus the conventional jet fuel balance.
pub(crate) fn add_demand(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let blend = ctx.policy.blend;
    for (a, airport) in ctx.registry.airports.values().enumerate() {
        let required = airport.demand * blend;
        out.push(
            ConstraintFamily::Demand,
            constraint!(delivered_saf(ctx, a) == required),
        );
    }

    let jet_fuel = ctx.registry.total_demand() * (1.0 - blend);
    out.push(
        ConstraintFamily::Demand,
        constraint!(ctx.vars.purchases.jet_fuel == jet_fuel),
    );
}

/// Societal sugar demand, ground-transport energy demand and the corn
/// ethanol cap.
pub(crate) fn add_market_bounds(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let market = ctx.market;
    let vars = ctx.vars;
    let purchases = &vars.purchases;
    let mills = &vars.mills;

    let sugar = sum((0..mills.len()).map(|i| mills.get(i, Product::Sugar)));
    out.push(
        ConstraintFamily::MarketBounds,
        constraint!(sugar + purchases.sugar >= market.sugar_demand),
    );

    let ethanol_fuel = purchases.corn_ethanol
        + sum((0..mills.len()).map(|i| mills.get(i, Product::EthanolMarket)));
    let mut gasoline = Expression::from(purchases.gasoline);
    for tier in Tier::ALL {
        let tier_vars = vars.tier(tier);
        gasoline += sum((0..tier_vars.len()).map(|e| tier_vars.get(e, Product::Gasoline)));
    }
    out.push(
        ConstraintFamily::MarketBounds,
        constraint!(
            market.ethanol_energy * ethanol_fuel + market.gasoline_energy * gasoline
                >= market.ground_demand
        ),
    );

    out.push(
        ConstraintFamily::MarketBounds,
        constraint!(purchases.corn_ethanol <= market.corn_ethanol_cap),
    );
}
