//! Entity and parameter registry
//!
//! Resolves raw [`CaseData`] tables into ordered entity sets, dense distance
//! matrices and typed conversion/price snapshots. Every lookup the
//! constraint builders will need is performed here, so a missing row fails
//! before the first variable is declared.

use atj_core::{
    AtjError, AtjResult, CaseData, ConversionCode, Diagnostics, DistanceMatrix, MillKind,
    PricedGood, Tier,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// A resolved mill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MillEntry {
    pub capacity: f64,
    pub kind: MillKind,
}

/// A resolved airport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportEntry {
    pub demand: f64,
}

/// Conversion rates, one field per code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversions {
    pub sc_to_jui: f64,
    pub sc_to_bag: f64,
    pub jui_to_sug: f64,
    pub sug_to_mol: f64,
    pub bag_to_el: f64,
    pub jui_to_et: f64,
    pub mol_to_et: f64,
    pub et_to_saf: f64,
    pub et_to_g: f64,
    pub et_to_d: f64,
}

impl Conversions {
    fn resolve(table: &IndexMap<String, f64>) -> AtjResult<Self> {
        let get = |code: ConversionCode| -> AtjResult<f64> {
            let rate = *table
                .get(code.as_str())
                .ok_or_else(|| AtjError::missing("conversions", code.as_str()))?;
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(AtjError::invalid(
                    format!("conversions.{}", code),
                    format!("must be a non-negative rate, got {}", rate),
                ));
            }
            Ok(rate)
        };

        Ok(Self {
            sc_to_jui: get(ConversionCode::ScToJui)?,
            sc_to_bag: get(ConversionCode::ScToBag)?,
            jui_to_sug: get(ConversionCode::JuiToSug)?,
            sug_to_mol: get(ConversionCode::SugToMol)?,
            bag_to_el: get(ConversionCode::BagToEl)?,
            jui_to_et: get(ConversionCode::JuiToEt)?,
            mol_to_et: get(ConversionCode::MolToEt)?,
            et_to_saf: get(ConversionCode::EtToSaf)?,
            et_to_g: get(ConversionCode::EtToG)?,
            et_to_d: get(ConversionCode::EtToD)?,
        })
    }

    pub fn get(&self, code: ConversionCode) -> f64 {
        match code {
            ConversionCode::ScToJui => self.sc_to_jui,
            ConversionCode::ScToBag => self.sc_to_bag,
            ConversionCode::JuiToSug => self.jui_to_sug,
            ConversionCode::SugToMol => self.sug_to_mol,
            ConversionCode::BagToEl => self.bag_to_el,
            ConversionCode::JuiToEt => self.jui_to_et,
            ConversionCode::MolToEt => self.mol_to_et,
            ConversionCode::EtToSaf => self.et_to_saf,
            ConversionCode::EtToG => self.et_to_g,
            ConversionCode::EtToD => self.et_to_d,
        }
    }

    /// Ethanol yield per unit of juice when it takes the sugar track
    /// (sugar -> molasses -> ethanol).
    pub fn sugar_track_ethanol_yield(&self) -> f64 {
        self.jui_to_sug * self.sug_to_mol * self.mol_to_et
    }
}

/// Selling prices and unit production costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prices {
    pub sugar: f64,
    pub ethanol: f64,
    pub electricity: f64,
    pub saf: f64,
    pub gasoline: f64,
    pub sugar_cost: f64,
    pub ethanol_cost: f64,
    pub electricity_cost: f64,
    pub saf_cost: f64,
}

impl Prices {
    fn resolve(table: &IndexMap<String, atj_core::PriceRecord>) -> AtjResult<Self> {
        let record = |good: PricedGood| {
            table
                .get(good.as_str())
                .ok_or_else(|| AtjError::missing("prices", good.as_str()))
        };
        let checked = |key: String, value: f64| -> AtjResult<f64> {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AtjError::invalid(
                    key,
                    format!("must be non-negative, got {}", value),
                ));
            }
            Ok(value)
        };
        let price = |good: PricedGood| -> AtjResult<f64> {
            checked(format!("prices.{}.price", good), record(good)?.price)
        };
        let cost = |good: PricedGood| -> AtjResult<f64> {
            let value = record(good)?
                .cost
                .ok_or_else(|| AtjError::missing("prices (cost)", good.as_str()))?;
            checked(format!("prices.{}.cost", good), value)
        };

        Ok(Self {
            sugar: price(PricedGood::Sugar)?,
            ethanol: price(PricedGood::Ethanol)?,
            electricity: price(PricedGood::Electricity)?,
            saf: price(PricedGood::Saf)?,
            gasoline: price(PricedGood::Gasoline)?,
            sugar_cost: cost(PricedGood::Sugar)?,
            ethanol_cost: cost(PricedGood::Ethanol)?,
            electricity_cost: cost(PricedGood::Electricity)?,
            saf_cost: cost(PricedGood::Saf)?,
        })
    }
}

/// Dense distance matrices indexed by set position, in flow direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distances {
    /// `[seller][buyer]`, zero on the diagonal
    pub mill_mill: Vec<Vec<f64>>,
    /// `[mill][airport]`
    pub mill_airport: Vec<Vec<f64>>,
    /// `[mill][refinery]`
    pub mill_refinery: Vec<Vec<f64>>,
    /// `[refinery][airport]`
    pub refinery_airport: Vec<Vec<f64>>,
}

/// Immutable, fully resolved view of one case.
#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub mills: IndexMap<String, MillEntry>,
    pub airports: IndexMap<String, AirportEntry>,
    pub refineries: Vec<String>,
    pub conversions: Conversions,
    pub prices: Prices,
    pub distances: Distances,
    pub diagnostics: Diagnostics,
}

impl Registry {
    /// Resolve every table of `case`, failing on the first missing or bad entry.
    pub fn resolve(case: &CaseData) -> AtjResult<Self> {
        let mut diagnostics = Diagnostics::new();

        let mut mills = IndexMap::new();
        for record in &case.mills {
            check_quantity(format!("mills.{}.capacity", record.name), record.capacity)?;
            if record.capacity == 0.0 {
                diagnostics.warn_about(
                    "capacity",
                    "zero crushing capacity",
                    &format!("mill {}", record.name),
                );
            }
            let entry = MillEntry {
                capacity: record.capacity,
                kind: MillKind::Ordinary,
            };
            if mills.insert(record.name.clone(), entry).is_some() {
                return Err(AtjError::DuplicateEntity {
                    table: "mills".into(),
                    entity: record.name.clone(),
                });
            }
        }

        for name in &case.annexed_mills {
            let mill = mills
                .get_mut(name)
                .ok_or_else(|| AtjError::unknown_entity("annexed_mills", name))?;
            mill.kind = MillKind::Annexed;
        }
        for name in &case.ethanol_mills {
            let mill = mills
                .get_mut(name)
                .ok_or_else(|| AtjError::unknown_entity("ethanol_mills", name))?;
            if mill.kind == MillKind::Annexed {
                return Err(AtjError::Config(format!(
                    "mill `{}` is listed in both annexed_mills and ethanol_mills",
                    name
                )));
            }
            mill.kind = MillKind::EthanolOnly;
        }

        let mut airports = IndexMap::new();
        for record in &case.airports {
            check_quantity(format!("airports.{}.demand", record.name), record.demand)?;
            if record.demand == 0.0 {
                diagnostics.warn_about(
                    "demand",
                    "zero jet fuel demand",
                    &format!("airport {}", record.name),
                );
            }
            let entry = AirportEntry {
                demand: record.demand,
            };
            if airports.insert(record.name.clone(), entry).is_some() {
                return Err(AtjError::DuplicateEntity {
                    table: "airports".into(),
                    entity: record.name.clone(),
                });
            }
        }

        let mut refineries: Vec<String> = Vec::with_capacity(case.refineries.len());
        for record in &case.refineries {
            if refineries.contains(&record.name) {
                return Err(AtjError::DuplicateEntity {
                    table: "refineries".into(),
                    entity: record.name.clone(),
                });
            }
            refineries.push(record.name.clone());
        }

        if mills.is_empty() {
            diagnostics.warn("topology", "case has no mills");
        }
        if airports.is_empty() {
            diagnostics.warn("topology", "case has no airports");
        }
        if refineries.is_empty() {
            diagnostics.warn("topology", "case has no refineries");
        }

        let conversions = Conversions::resolve(&case.conversions)?;
        let prices = Prices::resolve(&case.prices)?;

        let mill_names: Vec<&str> = mills.keys().map(String::as_str).collect();
        let airport_names: Vec<&str> = airports.keys().map(String::as_str).collect();
        let refinery_names: Vec<&str> = refineries.iter().map(String::as_str).collect();
        let d = &case.distances;

        check_keys("distances.mill_mill", &d.mill_mill, &mill_names, &mill_names)?;
        check_keys("distances.airport_mill", &d.airport_mill, &airport_names, &mill_names)?;
        check_keys("distances.refinery_mill", &d.refinery_mill, &refinery_names, &mill_names)?;
        check_keys(
            "distances.refinery_airport",
            &d.refinery_airport,
            &refinery_names,
            &airport_names,
        )?;

        let mut mill_mill = vec![vec![0.0; mill_names.len()]; mill_names.len()];
        for (i, from) in mill_names.iter().enumerate() {
            for (j, to) in mill_names.iter().enumerate() {
                if i != j {
                    mill_mill[i][j] = d.mill_mill.require("distances.mill_mill", from, to)?;
                }
            }
        }

        // Airport and refinery tables are keyed destination-first.
        let mut mill_airport = vec![vec![0.0; airport_names.len()]; mill_names.len()];
        let mut mill_refinery = vec![vec![0.0; refinery_names.len()]; mill_names.len()];
        for (i, mill) in mill_names.iter().enumerate() {
            for (a, airport) in airport_names.iter().enumerate() {
                mill_airport[i][a] =
                    d.airport_mill.require("distances.airport_mill", airport, mill)?;
            }
            for (r, refinery) in refinery_names.iter().enumerate() {
                mill_refinery[i][r] =
                    d.refinery_mill.require("distances.refinery_mill", refinery, mill)?;
            }
        }

        let mut refinery_airport = vec![vec![0.0; airport_names.len()]; refinery_names.len()];
        for (r, refinery) in refinery_names.iter().enumerate() {
            for (a, airport) in airport_names.iter().enumerate() {
                refinery_airport[r][a] =
                    d.refinery_airport
                        .require("distances.refinery_airport", refinery, airport)?;
            }
        }

        for issue in diagnostics.iter() {
            warn!("{}", issue);
        }
        debug!(
            mills = mills.len(),
            airports = airports.len(),
            refineries = refineries.len(),
            "resolved supply chain case"
        );

        Ok(Self {
            mills,
            airports,
            refineries,
            conversions,
            prices,
            distances: Distances {
                mill_mill,
                mill_airport,
                mill_refinery,
                refinery_airport,
            },
            diagnostics,
        })
    }

    pub fn num_mills(&self) -> usize {
        self.mills.len()
    }

    pub fn num_airports(&self) -> usize {
        self.airports.len()
    }

    pub fn num_refineries(&self) -> usize {
        self.refineries.len()
    }

    pub fn num_entities(&self, tier: Tier) -> usize {
        match tier {
            Tier::Mill => self.num_mills(),
            Tier::Airport => self.num_airports(),
            Tier::Refinery => self.num_refineries(),
        }
    }

    /// Entity name by tier and position.
    pub fn entity_name(&self, tier: Tier, index: usize) -> &str {
        match tier {
            Tier::Mill => self.mills.get_index(index).map(|(n, _)| n.as_str()),
            Tier::Airport => self.airports.get_index(index).map(|(n, _)| n.as_str()),
            Tier::Refinery => self.refineries.get(index).map(String::as_str),
        }
        .unwrap_or_default()
    }

    /// Position of an entity within its tier.
    pub fn entity_index(&self, tier: Tier, name: &str) -> Option<usize> {
        match tier {
            Tier::Mill => self.mills.get_index_of(name),
            Tier::Airport => self.airports.get_index_of(name),
            Tier::Refinery => self.refineries.iter().position(|r| r == name),
        }
    }

    pub fn mill_names(&self) -> impl Iterator<Item = &str> {
        self.mills.keys().map(String::as_str)
    }

    pub fn airport_names(&self) -> impl Iterator<Item = &str> {
        self.airports.keys().map(String::as_str)
    }

    pub fn refinery_names(&self) -> impl Iterator<Item = &str> {
        self.refineries.iter().map(String::as_str)
    }

    /// Largest ethanol output a mill can reach with any juice split.
    pub fn ethanol_potential(&self, mill: usize) -> f64 {
        let c = &self.conversions;
        let juice = self.mills[mill].capacity * c.sc_to_jui;
        juice * c.jui_to_et.max(c.sugar_track_ethanol_yield())
    }

    /// Ethanol potential summed over every mill.
    pub fn network_ethanol_potential(&self) -> f64 {
        (0..self.num_mills()).map(|i| self.ethanol_potential(i)).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.airports.values().map(|a| a.demand).sum()
    }
}

fn check_quantity(key: String, value: f64) -> AtjResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(AtjError::invalid(
            key,
            format!("must be non-negative, got {}", value),
        ));
    }
    Ok(())
}

/// Every origin and destination named in a distance table must belong to
/// the case.
fn check_keys(
    table: &str,
    matrix: &DistanceMatrix,
    origins: &[&str],
    destinations: &[&str],
) -> AtjResult<()> {
    for origin in matrix.origins() {
        if !origins.contains(&origin) {
            return Err(AtjError::unknown_entity(table, origin));
        }
        for destination in matrix.destinations(origin) {
            if !destinations.contains(&destination) {
                return Err(AtjError::unknown_entity(table, destination));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::small_case;

    #[test]
    fn test_resolve_kinds_and_distances() {
        let registry = Registry::resolve(&small_case()).unwrap();
        assert_eq!(registry.mills["Usina A"].kind, MillKind::Annexed);
        assert_eq!(registry.mills["Usina B"].kind, MillKind::EthanolOnly);
        assert_eq!(registry.distances.mill_mill[0][1], 50.0);
        assert_eq!(registry.distances.mill_mill[1][1], 0.0);
        assert_eq!(registry.distances.mill_airport[1][0], 50.0);
        assert_eq!(registry.distances.refinery_airport[0][0], 50.0);
        assert!(registry.diagnostics.is_empty());
    }

    #[test]
    fn test_ethanol_potential_uses_best_split() {
        let registry = Registry::resolve(&small_case()).unwrap();
        // 10 000 t * 0.8 juice * 0.08 ethanol
        assert!((registry.ethanol_potential(0) - 640.0).abs() < 1e-9);
        assert!((registry.network_ethanol_potential() - 1152.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_distance_names_matrix_and_pair() {
        let mut case = small_case();
        case.distances.refinery_mill = DistanceMatrix::new();
        let err = Registry::resolve(&case).unwrap_err();
        let msg = err.to_string();
        assert!(err.is_configuration());
        assert!(msg.contains("distances.refinery_mill"));
        assert!(msg.contains("REPLAN -> Usina A"));
    }

    #[test]
    fn test_unknown_membership_is_configuration_error() {
        let mut case = small_case();
        case.annexed_mills.push("Usina Z".into());
        let err = Registry::resolve(&case).unwrap_err();
        assert!(matches!(err, AtjError::UnknownEntity { ref table, ref entity }
            if table == "annexed_mills" && entity == "Usina Z"));
    }

    #[test]
    fn test_conflicting_membership_rejected() {
        let mut case = small_case();
        case.ethanol_mills.push("Usina A".into());
        assert!(matches!(Registry::resolve(&case), Err(AtjError::Config(_))));
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let mut case = small_case();
        case.mills[0].capacity = -1.0;
        let err = Registry::resolve(&case).unwrap_err();
        assert!(matches!(err, AtjError::InvalidValue { .. }));
        assert!(err.to_string().contains("mills.Usina A.capacity"));
    }

    #[test]
    fn test_missing_conversion_and_cost() {
        let mut case = small_case();
        case.conversions.shift_remove("jui_to_et");
        let err = Registry::resolve(&case).unwrap_err();
        assert!(err.to_string().contains("jui_to_et"));

        let mut case = small_case();
        case.prices.insert(
            "saf".into(),
            atj_core::PriceRecord {
                price: 6.0,
                cost: None,
            },
        );
        let err = Registry::resolve(&case).unwrap_err();
        assert!(err.to_string().contains("saf"));
    }

    #[test]
    fn test_duplicate_mill_rejected() {
        let mut case = small_case();
        case.mills.push(atj_core::MillRecord {
            name: "Usina A".into(),
            capacity: 5.0,
        });
        assert!(matches!(
            Registry::resolve(&case),
            Err(AtjError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_zero_demand_is_warning() {
        let mut case = small_case();
        case.airports[0].demand = 0.0;
        let registry = Registry::resolve(&case).unwrap();
        assert_eq!(registry.diagnostics.len(), 1);
        assert_eq!(registry.diagnostics.in_category("demand").count(), 1);
    }

    #[test]
    fn test_distance_row_for_unknown_entity_rejected() {
        let mut case = small_case();
        case.distances.airport_mill.insert("GHOST", "Usina A", 10.0);
        let err = Registry::resolve(&case).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, AtjError::UnknownEntity { ref table, ref entity }
            if table == "distances.airport_mill" && entity == "GHOST"));
    }

    #[test]
    fn test_distance_column_for_unknown_entity_rejected() {
        let mut case = small_case();
        case.distances.mill_mill.insert("Usina A", "Usina Z", 10.0);
        let err = Registry::resolve(&case).unwrap_err();
        assert!(matches!(err, AtjError::UnknownEntity { ref table, ref entity }
            if table == "distances.mill_mill" && entity == "Usina Z"));

        let mut case = small_case();
        case.distances.refinery_airport.insert("REPLAN", "CGH", 10.0);
        let err = Registry::resolve(&case).unwrap_err();
        assert!(err.to_string().contains("distances.refinery_airport"));
        assert!(err.to_string().contains("`CGH`"));
    }
}
