//! Closed vocabularies of the process network.
//!
//! Products, conversion codes and traded goods are fixed by the chemistry of
//! the alcohol-to-jet route, so they are enums rather than strings. Each enum
//! keeps the short code used in case files (`"jui"`, `"jui_to_et"`, ...) so
//! tabular inputs and exported results stay readable side by side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AtjError;

/// Every material label carried by a node's production vector.
///
/// Not every label is meaningful at every tier; the model declares one
/// production variable per (entity, product) anyway and pins the unused ones
/// through the mass balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "jui")]
    Juice,
    /// Juice routed to the sugar track (`j1`)
    #[serde(rename = "j1")]
    JuiceToSugar,
    /// Juice routed to the ethanol track (`j2`)
    #[serde(rename = "j2")]
    JuiceToEthanol,
    #[serde(rename = "bag")]
    Bagasse,
    #[serde(rename = "sug")]
    Sugar,
    #[serde(rename = "mol")]
    Molasses,
    #[serde(rename = "el")]
    Electricity,
    #[serde(rename = "et")]
    Ethanol,
    /// Ethanol sold on the fuel market (`etmk`)
    #[serde(rename = "etmk")]
    EthanolMarket,
    /// Ethanol sold to other mills that convert it (`etref`)
    #[serde(rename = "etref")]
    EthanolToMills,
    /// Ethanol fed to the mill's own SAF unit (`etsaf`)
    #[serde(rename = "etsaf")]
    EthanolSafFeed,
    /// Ethanol sold to airports (`eta`)
    #[serde(rename = "eta")]
    EthanolToAirports,
    /// Ethanol sold to refineries (`etr`)
    #[serde(rename = "etr")]
    EthanolToRefineries,
    /// Ethanol bought from other mills (`etpc`)
    #[serde(rename = "etpc")]
    EthanolPurchased,
    #[serde(rename = "saf")]
    Saf,
    #[serde(rename = "saf air")]
    SafToAirports,
    #[serde(rename = "saf ref")]
    SafToRefineries,
    #[serde(rename = "g")]
    Gasoline,
    #[serde(rename = "d")]
    Diesel,
    #[serde(rename = "blended saf")]
    BlendedSaf,
}

impl Product {
    pub const COUNT: usize = 20;

    pub const ALL: [Product; Product::COUNT] = [
        Product::Juice,
        Product::JuiceToSugar,
        Product::JuiceToEthanol,
        Product::Bagasse,
        Product::Sugar,
        Product::Molasses,
        Product::Electricity,
        Product::Ethanol,
        Product::EthanolMarket,
        Product::EthanolToMills,
        Product::EthanolSafFeed,
        Product::EthanolToAirports,
        Product::EthanolToRefineries,
        Product::EthanolPurchased,
        Product::Saf,
        Product::SafToAirports,
        Product::SafToRefineries,
        Product::Gasoline,
        Product::Diesel,
        Product::BlendedSaf,
    ];

    /// The five destinations a mill's ethanol output is split into.
    pub const ETHANOL_DESTINATIONS: [Product; 5] = [
        Product::EthanolMarket,
        Product::EthanolToMills,
        Product::EthanolSafFeed,
        Product::EthanolToAirports,
        Product::EthanolToRefineries,
    ];

    /// Position in [`Product::ALL`], used to index production tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            Product::Juice => "jui",
            Product::JuiceToSugar => "j1",
            Product::JuiceToEthanol => "j2",
            Product::Bagasse => "bag",
            Product::Sugar => "sug",
            Product::Molasses => "mol",
            Product::Electricity => "el",
            Product::Ethanol => "et",
            Product::EthanolMarket => "etmk",
            Product::EthanolToMills => "etref",
            Product::EthanolSafFeed => "etsaf",
            Product::EthanolToAirports => "eta",
            Product::EthanolToRefineries => "etr",
            Product::EthanolPurchased => "etpc",
            Product::Saf => "saf",
            Product::SafToAirports => "saf air",
            Product::SafToRefineries => "saf ref",
            Product::Gasoline => "g",
            Product::Diesel => "d",
            Product::BlendedSaf => "blended saf",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Product {
    type Err = AtjError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .copied()
            .find(|p| p.code() == value)
            .ok_or_else(|| AtjError::missing("products", value))
    }
}

/// Conversion factors of the process network, keyed in case files by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionCode {
    ScToJui,
    ScToBag,
    JuiToSug,
    SugToMol,
    BagToEl,
    JuiToEt,
    MolToEt,
    EtToSaf,
    EtToG,
    EtToD,
}

impl ConversionCode {
    pub const ALL: [ConversionCode; 10] = [
        ConversionCode::ScToJui,
        ConversionCode::ScToBag,
        ConversionCode::JuiToSug,
        ConversionCode::SugToMol,
        ConversionCode::BagToEl,
        ConversionCode::JuiToEt,
        ConversionCode::MolToEt,
        ConversionCode::EtToSaf,
        ConversionCode::EtToG,
        ConversionCode::EtToD,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConversionCode::ScToJui => "sc_to_jui",
            ConversionCode::ScToBag => "sc_to_bag",
            ConversionCode::JuiToSug => "jui_to_sug",
            ConversionCode::SugToMol => "sug_to_mol",
            ConversionCode::BagToEl => "bag_to_el",
            ConversionCode::JuiToEt => "jui_to_et",
            ConversionCode::MolToEt => "mol_to_et",
            ConversionCode::EtToSaf => "et_to_saf",
            ConversionCode::EtToG => "et_to_g",
            ConversionCode::EtToD => "et_to_d",
        }
    }
}

impl fmt::Display for ConversionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goods that carry a price (and possibly a unit production cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricedGood {
    #[serde(rename = "sug")]
    Sugar,
    #[serde(rename = "et")]
    Ethanol,
    #[serde(rename = "el")]
    Electricity,
    #[serde(rename = "saf")]
    Saf,
    #[serde(rename = "g")]
    Gasoline,
}

impl PricedGood {
    pub fn as_str(self) -> &'static str {
        match self {
            PricedGood::Sugar => "sug",
            PricedGood::Ethanol => "et",
            PricedGood::Electricity => "el",
            PricedGood::Saf => "saf",
            PricedGood::Gasoline => "g",
        }
    }
}

impl fmt::Display for PricedGood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node classes of the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Mill,
    Airport,
    Refinery,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Mill, Tier::Airport, Tier::Refinery];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Mill => "mill",
            Tier::Airport => "airport",
            Tier::Refinery => "refinery",
        }
    }

    /// Airports and refineries build conversion capacity from scratch.
    pub fn is_greenfield(self) -> bool {
        !matches!(self, Tier::Mill)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AtjError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mill" | "mills" => Ok(Tier::Mill),
            "airport" | "airports" => Ok(Tier::Airport),
            "refinery" | "refineries" => Ok(Tier::Refinery),
            other => Err(AtjError::Config(format!(
                "unknown tier '{}'; expected mill, airport or refinery",
                other
            ))),
        }
    }
}

/// Production regime of a mill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MillKind {
    /// Free to split juice between sugar and ethanol
    #[default]
    Ordinary,
    /// Sugar and ethanol with minimum production floors
    Annexed,
    /// No sugar track at all
    EthanolOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_index_matches_all_order() {
        for (i, product) in Product::ALL.iter().enumerate() {
            assert_eq!(product.index(), i, "{} out of order", product);
        }
    }

    #[test]
    fn test_product_codes_parse_back() {
        for product in Product::ALL {
            assert_eq!(product.code().parse::<Product>().unwrap(), product);
        }
        assert!("kerosene".parse::<Product>().is_err());
    }

    #[test]
    fn test_product_serde_uses_codes() {
        let json = serde_json::to_string(&Product::SafToRefineries).unwrap();
        assert_eq!(json, "\"saf ref\"");
        let back: Product = serde_json::from_str("\"etpc\"").unwrap();
        assert_eq!(back, Product::EthanolPurchased);
    }

    #[test]
    fn test_conversion_code_serde_matches_as_str() {
        for code in ConversionCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_tier_parsing_and_greenfield() {
        assert_eq!("Refineries".parse::<Tier>().unwrap(), Tier::Refinery);
        assert!("harbour".parse::<Tier>().is_err());
        assert!(!Tier::Mill.is_greenfield());
        assert!(Tier::Airport.is_greenfield());
    }
}
