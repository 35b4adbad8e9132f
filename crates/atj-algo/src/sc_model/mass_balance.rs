//! Mass-balance constraints
//!
//! Every balance is an equality and every output is an explicit
//! conversion-rate multiple of a named input:
//!
//! ```text
//! Mills
//!   jui = cap · sc_to_jui          bag = cap · sc_to_bag
//!   jui = j1 + j2
//!   sug = j1 · jui_to_sug          mol = sug · sug_to_mol
//!   el  = bag · bag_to_el
//!   et  = j2 · jui_to_et + mol · mol_to_et
//!   et  = etmk + etref + etsaf + eta + etr
//!   saf = (etsaf + etpc) · et_to_saf    (likewise g, d)
//!   saf = saf air + saf ref
//!   ethanol-only:  j1 = 0
//!   annexed:       j1 ≥ min_sugar · jui,  et ≥ min_ethanol · jui · jui_to_et
//!
//! Airports, refineries
//!   saf = et · et_to_saf           (likewise g, d)
//!   refineries: blended saf = saf + saf ref
//! ```

use atj_core::{MillKind, Product, Tier};
use good_lp::{constraint, Expression};

use super::model::{BuildContext, ConstraintFamily, ConstraintSet};

pub(crate) fn add_mill_balances(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let c = &ctx.registry.conversions;
    let x = &ctx.vars.mills;

    for (i, mill) in ctx.registry.mills.values().enumerate() {
        let v = |p: Product| x.get(i, p);

        let juice = mill.capacity * c.sc_to_jui;
        let bagasse = mill.capacity * c.sc_to_bag;
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Juice) == juice),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Bagasse) == bagasse),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Juice) == v(Product::JuiceToSugar) + v(Product::JuiceToEthanol)),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Sugar) == c.jui_to_sug * v(Product::JuiceToSugar)),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Molasses) == c.sug_to_mol * v(Product::Sugar)),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Electricity) == c.bag_to_el * v(Product::Bagasse)),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(
                v(Product::Ethanol)
                    == c.jui_to_et * v(Product::JuiceToEthanol) + c.mol_to_et * v(Product::Molasses)
            ),
        );

        let mut destinations = Expression::from(0.0);
        for product in Product::ETHANOL_DESTINATIONS {
            destinations += v(product);
        }
        out.push(
            ConstraintFamily::EthanolSplit,
            constraint!(v(Product::Ethanol) == destinations),
        );

        let feed = v(Product::EthanolSafFeed) + v(Product::EthanolPurchased);
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Saf) == c.et_to_saf * feed.clone()),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Gasoline) == c.et_to_g * feed.clone()),
        );
        out.push(
            ConstraintFamily::MassBalance,
            constraint!(v(Product::Diesel) == c.et_to_d * feed),
        );

        out.push(
            ConstraintFamily::SafSplit,
            constraint!(
                v(Product::Saf) == v(Product::SafToAirports) + v(Product::SafToRefineries)
            ),
        );

        match mill.kind {
            MillKind::Ordinary => {}
            MillKind::EthanolOnly => {
                out.push(
                    ConstraintFamily::MillKind,
                    constraint!(v(Product::JuiceToSugar) == 0.0),
                );
            }
            MillKind::Annexed => {
                let sugar_floor = ctx.market.min_sugar_fraction;
                let ethanol_floor = ctx.market.min_ethanol_fraction * c.jui_to_et;
                out.push(
                    ConstraintFamily::MillKind,
                    constraint!(v(Product::JuiceToSugar) >= sugar_floor * v(Product::Juice)),
                );
                out.push(
                    ConstraintFamily::MillKind,
                    constraint!(v(Product::Ethanol) >= ethanol_floor * v(Product::Juice)),
                );
            }
        }
    }
}

/// Standalone conversion at airports and refineries.
pub(crate) fn add_greenfield_balances(ctx: &BuildContext<'_>, out: &mut ConstraintSet) {
    let c = &ctx.registry.conversions;

    for tier in [Tier::Airport, Tier::Refinery] {
        let vars = ctx.vars.tier(tier);
        for e in 0..vars.len() {
            let v = |p: Product| vars.get(e, p);
            out.push(
                ConstraintFamily::MassBalance,
                constraint!(v(Product::Saf) == c.et_to_saf * v(Product::Ethanol)),
            );
            out.push(
                ConstraintFamily::MassBalance,
                constraint!(v(Product::Gasoline) == c.et_to_g * v(Product::Ethanol)),
            );
            out.push(
                ConstraintFamily::MassBalance,
                constraint!(v(Product::Diesel) == c.et_to_d * v(Product::Ethanol)),
            );
            if tier == Tier::Refinery {
                out.push(
                    ConstraintFamily::MassBalance,
                    constraint!(
                        v(Product::BlendedSaf) == v(Product::Saf) + v(Product::SafToRefineries)
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sc_model::model::SupplyChainModel;
    use crate::test_utils::{small_case, small_market, small_policy};

    #[test]
    fn test_balance_counts_per_mill_kind() {
        let model =
            SupplyChainModel::build(&small_case(), &small_policy(0.2), &small_market()).unwrap();
        let by_family = &model.stats().constraints_by_family;

        // 10 balances per mill, 3 per airport, 4 per refinery
        assert_eq!(by_family[&ConstraintFamily::MassBalance], 2 * 10 + 3 + 4);
        assert_eq!(by_family[&ConstraintFamily::EthanolSplit], 2);
        assert_eq!(by_family[&ConstraintFamily::SafSplit], 2);
        // annexed: two floors, ethanol-only: one pin
        assert_eq!(by_family[&ConstraintFamily::MillKind], 3);
    }
}
