//! Raw case data: the tables a supply chain model is built from.
//!
//! `CaseData` is deliberately dumb. It mirrors the tabular inputs (entity
//! lists, membership lists, distance matrices, conversion and price tables)
//! without interpreting them; resolving names, checking completeness and
//! rejecting bad values happens when the model registry is built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::distance::DistanceTables;
use crate::error::{AtjError, AtjResult};
use crate::product::{ConversionCode, PricedGood};

/// A sugarcane mill row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MillRecord {
    pub name: String,
    /// Crushing capacity (t sugarcane / year)
    pub capacity: f64,
}

/// An airport row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub name: String,
    /// Baseline jet fuel demand (m3 / year)
    pub demand: f64,
}

/// A refinery row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineryRecord {
    pub name: String,
}

/// Selling price and, where it applies, unit production cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: f64,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// Every table needed to build one supply chain model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseData {
    #[serde(default)]
    pub mills: Vec<MillRecord>,
    #[serde(default)]
    pub airports: Vec<AirportRecord>,
    #[serde(default)]
    pub refineries: Vec<RefineryRecord>,
    /// Mills that must keep minimum sugar and ethanol rates
    #[serde(default)]
    pub annexed_mills: Vec<String>,
    /// Mills without a sugar track
    #[serde(default)]
    pub ethanol_mills: Vec<String>,
    #[serde(default)]
    pub distances: DistanceTables,
    /// Conversion code -> rate
    #[serde(default)]
    pub conversions: IndexMap<String, f64>,
    /// Product code -> price/cost
    #[serde(default)]
    pub prices: IndexMap<String, PriceRecord>,
}

impl CaseData {
    /// Load a case from JSON or YAML, chosen by file extension.
    pub fn load(path: &Path) -> AtjResult<Self> {
        let data = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(serde_yaml::from_str(&data)?)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(serde_json::from_str(&data)?),
            _ => serde_json::from_str(&data)
                .or_else(|_| serde_yaml::from_str(&data))
                .map_err(|err| {
                    AtjError::Parse(format!("parsing case '{}': {}", path.display(), err))
                }),
        }
    }

    /// Write the case as pretty JSON.
    pub fn save_json(&self, path: &Path) -> AtjResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
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

    /// Total baseline jet fuel demand over all airports.
    pub fn total_demand(&self) -> f64 {
        self.airports.iter().map(|a| a.demand).sum()
    }
}

/// Builder for assembling cases in code (tests, synthetic studies).
#[derive(Debug, Default)]
pub struct CaseDataBuilder {
    case: CaseData,
}

impl CaseDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mill(mut self, name: impl Into<String>, capacity: f64) -> Self {
        self.case.mills.push(MillRecord {
            name: name.into(),
            capacity,
        });
        self
    }

    /// Add a mill and list it as annexed.
    pub fn annexed_mill(mut self, name: impl Into<String>, capacity: f64) -> Self {
        let name = name.into();
        self.case.annexed_mills.push(name.clone());
        self.mill(name, capacity)
    }

    /// Add a mill and list it as ethanol-only.
    pub fn ethanol_mill(mut self, name: impl Into<String>, capacity: f64) -> Self {
        let name = name.into();
        self.case.ethanol_mills.push(name.clone());
        self.mill(name, capacity)
    }

    pub fn airport(mut self, name: impl Into<String>, demand: f64) -> Self {
        self.case.airports.push(AirportRecord {
            name: name.into(),
            demand,
        });
        self
    }

    pub fn refinery(mut self, name: impl Into<String>) -> Self {
        self.case.refineries.push(RefineryRecord { name: name.into() });
        self
    }

    pub fn mill_mill_distance(mut self, from: &str, to: &str, km: f64) -> Self {
        self.case.distances.mill_mill.insert(from, to, km);
        self
    }

    pub fn airport_mill_distance(mut self, airport: &str, mill: &str, km: f64) -> Self {
        self.case.distances.airport_mill.insert(airport, mill, km);
        self
    }

    pub fn refinery_mill_distance(mut self, refinery: &str, mill: &str, km: f64) -> Self {
        self.case.distances.refinery_mill.insert(refinery, mill, km);
        self
    }

    pub fn refinery_airport_distance(mut self, refinery: &str, airport: &str, km: f64) -> Self {
        self.case.distances.refinery_airport.insert(refinery, airport, km);
        self
    }

    /// Fill every missing pair of every matrix with the same distance.
    ///
    /// Pairs already set keep their value. Call after all entities are added.
    pub fn uniform_distances(mut self, km: f64) -> Self {
        let mills: Vec<String> = self.case.mills.iter().map(|m| m.name.clone()).collect();
        let airports: Vec<String> = self.case.airports.iter().map(|a| a.name.clone()).collect();
        let refineries: Vec<String> = self.case.refineries.iter().map(|r| r.name.clone()).collect();
        let d = &mut self.case.distances;

        for from in &mills {
            for to in mills.iter().filter(|to| *to != from) {
                if d.mill_mill.get(from, to).is_none() {
                    d.mill_mill.insert(from.as_str(), to.as_str(), km);
                }
            }
        }
        for airport in &airports {
            for mill in &mills {
                if d.airport_mill.get(airport, mill).is_none() {
                    d.airport_mill.insert(airport.as_str(), mill.as_str(), km);
                }
            }
        }
        for refinery in &refineries {
            for mill in &mills {
                if d.refinery_mill.get(refinery, mill).is_none() {
                    d.refinery_mill.insert(refinery.as_str(), mill.as_str(), km);
                }
            }
            for airport in &airports {
                if d.refinery_airport.get(refinery, airport).is_none() {
                    d.refinery_airport
                        .insert(refinery.as_str(), airport.as_str(), km);
                }
            }
        }
        self
    }

    pub fn conversion(mut self, code: ConversionCode, rate: f64) -> Self {
        self.case.conversions.insert(code.as_str().to_string(), rate);
        self
    }

    pub fn price(mut self, good: PricedGood, price: f64, cost: Option<f64>) -> Self {
        self.case
            .prices
            .insert(good.as_str().to_string(), PriceRecord { price, cost });
        self
    }

    pub fn build(self) -> CaseData {
        self.case
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_case() -> CaseData {
        CaseDataBuilder::new()
            .annexed_mill("Usina A", 10_000.0)
            .ethanol_mill("Usina B", 8_000.0)
            .airport("GRU", 1_000.0)
            .refinery("REPLAN")
            .mill_mill_distance("Usina A", "Usina B", 12.0)
            .uniform_distances(50.0)
            .conversion(ConversionCode::ScToJui, 0.8)
            .price(PricedGood::Sugar, 2.0, Some(1.0))
            .build()
    }

    #[test]
    fn test_builder_tracks_membership_lists() {
        let case = small_case();
        assert_eq!(case.num_mills(), 2);
        assert_eq!(case.annexed_mills, vec!["Usina A".to_string()]);
        assert_eq!(case.ethanol_mills, vec!["Usina B".to_string()]);
        assert_eq!(case.total_demand(), 1_000.0);
    }

    #[test]
    fn test_uniform_distances_keeps_explicit_pairs() {
        let case = small_case();
        let d = &case.distances;
        assert_eq!(d.mill_mill.get("Usina A", "Usina B"), Some(12.0));
        assert_eq!(d.mill_mill.get("Usina B", "Usina A"), Some(50.0));
        assert_eq!(d.mill_mill.get("Usina A", "Usina A"), None);
        assert_eq!(d.airport_mill.len(), 2);
        assert_eq!(d.refinery_mill.len(), 2);
        assert_eq!(d.refinery_airport.get("REPLAN", "GRU"), Some(50.0));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let case = small_case();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        case.save_json(&path).unwrap();

        let loaded = CaseData::load(&path).unwrap();
        assert_eq!(loaded, case);
    }

    #[test]
    fn test_yaml_case_loads() {
        let yaml = r#"
mills:
  - { name: Usina A, capacity: 1000 }
airports:
  - { name: GRU, demand: 50 }
conversions:
  sc_to_jui: 0.8
prices:
  sug: { price: 2.0, cost: 1.0 }
  g: { price: 3.0 }
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.yaml");
        std::fs::write(&path, yaml).unwrap();

        let case = CaseData::load(&path).unwrap();
        assert_eq!(case.mills[0].capacity, 1000.0);
        assert_eq!(case.conversions["sc_to_jui"], 0.8);
        assert_eq!(case.prices["g"].cost, None);
        assert!(case.refineries.is_empty());
    }

    #[test]
    fn test_malformed_case_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(&path, "{ mills: [").unwrap();
        assert!(matches!(CaseData::load(&path), Err(AtjError::Parse(_))));
    }
}
