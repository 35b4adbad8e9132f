//! Pairwise distance matrices between tiers.
//!
//! Stored sparse as `origin -> destination -> km` so case files read naturally,
//! but consumed strictly: a missing pair is a configuration error, never an
//! implicit zero.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AtjError, AtjResult};

/// One origin/destination distance table (kilometres).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceMatrix {
    entries: IndexMap<String, IndexMap<String, f64>>,
}

impl DistanceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>, km: f64) {
        self.entries
            .entry(from.into())
            .or_default()
            .insert(to.into(), km);
    }

    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.entries.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Strict lookup used during model construction.
    ///
    /// `table` names the matrix in the error (e.g. `"distances.airport_mill"`).
    pub fn require(&self, table: &str, from: &str, to: &str) -> AtjResult<f64> {
        let km = self
            .get(from, to)
            .ok_or_else(|| AtjError::missing(table, format!("{} -> {}", from, to)))?;
        if !km.is_finite() || km < 0.0 {
            return Err(AtjError::invalid(
                format!("{}[{} -> {}]", table, from, to),
                format!("must be a non-negative distance, got {}", km),
            ));
        }
        Ok(km)
    }

    /// Origins that appear in the table, in insertion order.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Destinations listed under one origin.
    pub fn destinations<'a>(&'a self, from: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .get(from)
            .into_iter()
            .flat_map(|row| row.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four matrices a case needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceTables {
    /// Seller mill -> buyer mill
    #[serde(default)]
    pub mill_mill: DistanceMatrix,
    /// Airport -> mill
    #[serde(default)]
    pub airport_mill: DistanceMatrix,
    /// Refinery -> mill
    #[serde(default)]
    pub refinery_mill: DistanceMatrix,
    /// Refinery -> airport
    #[serde(default)]
    pub refinery_airport: DistanceMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_missing_pair() {
        let mut m = DistanceMatrix::new();
        m.insert("GRU", "Usina A", 120.0);

        assert_eq!(m.require("distances.airport_mill", "GRU", "Usina A").unwrap(), 120.0);

        let err = m
            .require("distances.airport_mill", "GRU", "Usina B")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("distances.airport_mill"));
        assert!(msg.contains("GRU -> Usina B"));
    }

    #[test]
    fn test_require_rejects_negative_distance() {
        let mut m = DistanceMatrix::new();
        m.insert("REPLAN", "GRU", -5.0);
        let err = m
            .require("distances.refinery_airport", "REPLAN", "GRU")
            .unwrap_err();
        assert!(matches!(err, AtjError::InvalidValue { .. }));
    }

    #[test]
    fn test_nested_json_layout() {
        let json = r#"{ "Usina A": { "Usina B": 35.0 }, "Usina B": { "Usina A": 35.0 } }"#;
        let m: DistanceMatrix = serde_json::from_str(json).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("Usina B", "Usina A"), Some(35.0));
        assert_eq!(m.origins().collect::<Vec<_>>(), vec!["Usina A", "Usina B"]);
        assert_eq!(m.destinations("Usina A").collect::<Vec<_>>(), vec!["Usina B"]);
    }
}
