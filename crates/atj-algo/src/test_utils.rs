//! Small reference network shared by unit tests, integration tests and the
//! downstream crates' test suites.
//!
//! Two mills (one annexed, one ethanol-only), one airport with 1000 m3 of jet
//! demand and one refinery, 50 km apart. Market constants are scaled down so
//! a SAF plant at the first CAPEX breakpoint is affordable.

use atj_core::{CaseData, CaseDataBuilder, ConversionCode, PricedGood};

use crate::sc_model::{MarketParameters, Policy};

pub const ANNEXED_MILL: &str = "Usina A";
pub const ETHANOL_MILL: &str = "Usina B";
pub const AIRPORT: &str = "GRU";
pub const REFINERY: &str = "REPLAN";

pub fn small_case() -> CaseData {
    let mut builder = CaseDataBuilder::new()
        .annexed_mill(ANNEXED_MILL, 10_000.0)
        .ethanol_mill(ETHANOL_MILL, 8_000.0)
        .airport(AIRPORT, 1_000.0)
        .refinery(REFINERY)
        .uniform_distances(50.0);

    for (code, rate) in [
        (ConversionCode::ScToJui, 0.8),
        (ConversionCode::ScToBag, 0.25),
        (ConversionCode::JuiToSug, 0.15),
        (ConversionCode::SugToMol, 0.05),
        (ConversionCode::BagToEl, 0.5),
        (ConversionCode::JuiToEt, 0.08),
        (ConversionCode::MolToEt, 0.3),
        (ConversionCode::EtToSaf, 0.5),
        (ConversionCode::EtToG, 0.1),
        (ConversionCode::EtToD, 0.05),
    ] {
        builder = builder.conversion(code, rate);
    }

    builder
        .price(PricedGood::Sugar, 2.0, Some(1.0))
        .price(PricedGood::Ethanol, 3.0, Some(1.5))
        .price(PricedGood::Electricity, 0.5, Some(0.2))
        .price(PricedGood::Saf, 6.0, Some(1.0))
        .price(PricedGood::Gasoline, 3.0, None)
        .build()
}

/// Market constants sized for [`small_case`].
pub fn small_market() -> MarketParameters {
    MarketParameters {
        reference_capex: 1_000.0,
        reference_flow: 400.0,
        logistics_rate: 0.01,
        fixed_logistics_rate: 0.5,
        sugar_demand: 500.0,
        ground_demand: 10.0,
        greenfield_opex_airport: 1.0,
        greenfield_opex_refinery: 1.0,
        min_saf_size_mill: 10.0,
        min_saf_size_airport: 1.0,
        min_saf_size_refinery: 10.0,
        ..MarketParameters::default()
    }
}

/// Blend mandate `blend`, 400 m3 capacity cap, breakpoints {0, 200, 400}.
pub fn small_policy(blend: f64) -> Policy {
    Policy::new(blend, 400.0).with_breakpoints(3)
}
