//! # atj-core: Alcohol-to-Jet Supply Chain Core
//!
//! Data structures shared by every crate of the workspace: the closed product
//! vocabulary of the sugarcane-to-SAF process network, the raw case tables
//! (mills, airports, refineries, distances, conversion rates, prices), the
//! unified error type and non-fatal diagnostics.
//!
//! ## Quick Start
//!
//! ```rust
//! use atj_core::*;
//!
//! let case = CaseDataBuilder::new()
//!     .mill("Usina A", 1_000_000.0)
//!     .ethanol_mill("Usina B", 800_000.0)
//!     .airport("GRU", 50_000.0)
//!     .refinery("REPLAN")
//!     .uniform_distances(120.0)
//!     .conversion(ConversionCode::JuiToEt, 0.08)
//!     .price(PricedGood::Saf, 6.0, Some(1.0))
//!     .build();
//!
//! assert_eq!(case.num_mills(), 2);
//! assert_eq!(case.distances.mill_mill.len(), 2);
//! ```
//!
//! Interpretation of the tables (kinds, completeness checks, default
//! parameters) lives in `atj-algo`; this crate only carries them.

pub mod case;
pub mod diagnostics;
pub mod distance;
pub mod error;
pub mod product;

pub use case::{AirportRecord, CaseData, CaseDataBuilder, MillRecord, PriceRecord, RefineryRecord};
pub use diagnostics::{Diagnostics, Warning};
pub use distance::{DistanceMatrix, DistanceTables};
pub use error::{AtjError, AtjResult};
pub use product::{ConversionCode, MillKind, PricedGood, Product, Tier};
