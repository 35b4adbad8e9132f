//! Policy scalars and market parameters.
//!
//! [`Policy`] holds what a study varies (premiums, blend mandate, capacity
//! cap, objective mode, ...). [`MarketParameters`] holds the physical and
//! economic constants that are normally left at their defaults but remain
//! overridable per case. [`ParameterOverrides`] is the sparse patch a sweep
//! point applies to a fresh copy of both.

use atj_core::{AtjError, AtjResult, Tier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which scalar objective the model optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    /// Maximize aggregate supply chain profit
    #[default]
    Profit,
    /// Minimize system-wide supply chain cost
    Cost,
}

impl ObjectiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveMode::Profit => "profit",
            ObjectiveMode::Cost => "cost",
        }
    }
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectiveMode {
    type Err = AtjError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "profit" | "max-profit" => Ok(ObjectiveMode::Profit),
            "cost" | "min-cost" => Ok(ObjectiveMode::Cost),
            other => Err(AtjError::Config(format!(
                "unknown objective mode '{}'; expected profit or cost",
                other
            ))),
        }
    }
}

/// Where SAF may be blended into the airport jet fuel supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendingPolicy {
    /// Mills, refineries and on-site airport conversion all count toward demand
    #[default]
    AirportOrRefinery,
    /// Only refinery blended SAF counts toward the mandate; direct mill
    /// deliveries stay open but fall outside it
    RefineryOnly,
}

impl FromStr for BlendingPolicy {
    type Err = AtjError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "airport_or_refinery" | "any" => Ok(BlendingPolicy::AirportOrRefinery),
            "refinery_only" | "refinery" => Ok(BlendingPolicy::RefineryOnly),
            other => Err(AtjError::Config(format!(
                "unknown blending policy '{}'; expected airport_or_refinery or refinery_only",
                other
            ))),
        }
    }
}

/// Investment state of one entity.
///
/// Only `Undecided` entities carry a free binary and the big-M disjunction;
/// the other two states fix the binary and pin the excluded trade terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentState {
    #[default]
    Undecided,
    /// No SAF capacity; may only sell ethanol
    Producer,
    /// Builds SAF capacity; may only buy ethanol
    Converter,
}

impl InvestmentState {
    pub fn from_invest(invest: bool) -> Self {
        if invest {
            InvestmentState::Converter
        } else {
            InvestmentState::Producer
        }
    }

    /// Fixed binary value, if any.
    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            InvestmentState::Undecided => None,
            InvestmentState::Producer => Some(0.0),
            InvestmentState::Converter => Some(1.0),
        }
    }
}

/// Pin the investment binary of one entity, or of a whole tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentFix {
    pub tier: Tier,
    /// `None` applies the fix to every entity of the tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub invest: bool,
}

impl InvestmentFix {
    pub fn tier(tier: Tier, invest: bool) -> Self {
        Self {
            tier,
            entity: None,
            invest,
        }
    }

    pub fn entity(tier: Tier, entity: impl Into<String>, invest: bool) -> Self {
        Self {
            tier,
            entity: Some(entity.into()),
            invest,
        }
    }
}

impl FromStr for InvestmentFix {
    type Err = AtjError;

    /// Parses `tier=bool` or `tier:entity=bool`, e.g. `airport=false`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (target, flag) = value.split_once('=').ok_or_else(|| {
            AtjError::Config(format!(
                "invalid investment fix '{}'; expected tier[:entity]=true|false",
                value
            ))
        })?;
        let invest = flag.trim().parse::<bool>().map_err(|_| {
            AtjError::Config(format!(
                "invalid investment flag '{}' in '{}'; expected true or false",
                flag, value
            ))
        })?;
        match target.split_once(':') {
            Some((tier, entity)) => Ok(InvestmentFix::entity(
                tier.trim().parse()?,
                entity.trim(),
                invest,
            )),
            None => Ok(InvestmentFix::tier(target.trim().parse()?, invest)),
        }
    }
}

/// Study-level policy scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Price premium on SAF sold by mills (currency / m3)
    pub saf_premium: f64,
    /// Price premium on ethanol sold for conversion (currency / m3)
    pub eth_premium: f64,
    /// Fraction of airport jet demand met by SAF, in [0, 1]
    pub blend: f64,
    /// Largest SAF capacity any single node may build (m3 / year)
    pub max_saf_capacity: f64,
    /// Number of piecewise breakpoints, at least 2
    pub breakpoints: usize,
    pub objective: ObjectiveMode,
    /// Fractional CAPEX increase for greenfield (airport, refinery) builds
    pub greenfield_factor: f64,
    pub blending: BlendingPolicy,
    /// Let per-mill incentive payments float instead of pinning them to zero
    pub incentives: bool,
    pub investment_fixes: Vec<InvestmentFix>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            saf_premium: 0.0,
            eth_premium: 0.0,
            blend: 0.0,
            max_saf_capacity: 700_000.0,
            breakpoints: 10,
            objective: ObjectiveMode::Profit,
            greenfield_factor: 0.5,
            blending: BlendingPolicy::AirportOrRefinery,
            incentives: false,
            investment_fixes: Vec::new(),
        }
    }
}

impl Policy {
    pub fn new(blend: f64, max_saf_capacity: f64) -> Self {
        Self {
            blend,
            max_saf_capacity,
            ..Self::default()
        }
    }

    pub fn with_premiums(mut self, saf_premium: f64, eth_premium: f64) -> Self {
        self.saf_premium = saf_premium;
        self.eth_premium = eth_premium;
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: usize) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_objective(mut self, objective: ObjectiveMode) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_blending(mut self, blending: BlendingPolicy) -> Self {
        self.blending = blending;
        self
    }

    pub fn with_greenfield_factor(mut self, factor: f64) -> Self {
        self.greenfield_factor = factor;
        self
    }

    pub fn with_incentives(mut self, enabled: bool) -> Self {
        self.incentives = enabled;
        self
    }

    pub fn fix_investment(mut self, fix: InvestmentFix) -> Self {
        self.investment_fixes.push(fix);
        self
    }

    /// CAPEX multiplier for a tier.
    pub fn capex_markup(&self, tier: Tier) -> f64 {
        if tier.is_greenfield() {
            1.0 + self.greenfield_factor
        } else {
            1.0
        }
    }

    /// Reject values the formulation cannot express.
    pub fn validate(&self) -> AtjResult<()> {
        if self.breakpoints < 2 {
            return Err(AtjError::Formulation(format!(
                "breakpoints must be at least 2, got {}",
                self.breakpoints
            )));
        }
        if !(self.max_saf_capacity.is_finite() && self.max_saf_capacity > 0.0) {
            return Err(AtjError::Formulation(format!(
                "max SAF capacity must be positive, got {}",
                self.max_saf_capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.blend) {
            return Err(AtjError::Formulation(format!(
                "blend fraction must lie in [0, 1], got {}",
                self.blend
            )));
        }
        for (key, value) in [
            ("policy.saf_premium", self.saf_premium),
            ("policy.eth_premium", self.eth_premium),
        ] {
            if !value.is_finite() {
                return Err(AtjError::invalid(key, format!("must be finite, got {}", value)));
            }
        }
        if !(self.greenfield_factor.is_finite() && self.greenfield_factor >= 0.0) {
            return Err(AtjError::invalid(
                "policy.greenfield_factor",
                format!("must be non-negative, got {}", self.greenfield_factor),
            ));
        }
        Ok(())
    }
}

/// Physical and economic constants of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketParameters {
    /// Explicit global big-M; derived per use-site from ethanol potential when `None`
    pub big_m: Option<f64>,
    pub capex_exponent: f64,
    pub amortization: f64,
    /// Minimum sugar-track share of juice at annexed mills
    pub min_sugar_fraction: f64,
    /// Minimum ethanol output of annexed mills, as a share of all-juice ethanol
    pub min_ethanol_fraction: f64,
    /// CAPEX of the reference plant (currency / year)
    pub reference_capex: f64,
    /// Ethanol throughput of the reference plant (m3 / year)
    pub reference_flow: f64,
    /// currency / (km m3)
    pub logistics_rate: f64,
    /// currency / m3
    pub fixed_logistics_rate: f64,
    /// TJ / m3
    pub ethanol_energy: f64,
    /// TJ / m3
    pub gasoline_energy: f64,
    /// t / year
    pub sugar_demand: f64,
    /// TJ / year
    pub ground_demand: f64,
    /// Corn ethanol available on the market (m3 / year)
    pub corn_ethanol_cap: f64,
    /// currency / m3 SAF
    pub greenfield_opex_airport: f64,
    /// currency / m3 SAF
    pub greenfield_opex_refinery: f64,
    pub min_saf_size_mill: f64,
    pub min_saf_size_airport: f64,
    pub min_saf_size_refinery: f64,
}

impl Default for MarketParameters {
    fn default() -> Self {
        Self {
            big_m: None,
            capex_exponent: 0.65,
            amortization: 1.0,
            min_sugar_fraction: 0.4,
            min_ethanol_fraction: 0.4,
            reference_capex: 11_970_824.0,
            reference_flow: 84_000.0,
            logistics_rate: 0.16,
            fixed_logistics_rate: 17.82,
            ethanol_energy: 0.0212,
            gasoline_energy: 0.02952,
            sugar_demand: 44_000_000.0,
            ground_demand: 1_740_000.0,
            corn_ethanol_cap: 6_000_000.0,
            greenfield_opex_airport: 1130.0,
            greenfield_opex_refinery: 1130.0,
            min_saf_size_mill: 28_008.0,
            min_saf_size_airport: 1.0,
            min_saf_size_refinery: 28_000.0,
        }
    }
}

impl MarketParameters {
    pub fn min_saf_size(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Mill => self.min_saf_size_mill,
            Tier::Airport => self.min_saf_size_airport,
            Tier::Refinery => self.min_saf_size_refinery,
        }
    }

    pub fn greenfield_opex(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Mill => 0.0,
            Tier::Airport => self.greenfield_opex_airport,
            Tier::Refinery => self.greenfield_opex_refinery,
        }
    }

    /// Cost of shipping one m3 over `km`.
    pub fn unit_logistics_cost(&self, km: f64) -> f64 {
        self.logistics_rate * km + self.fixed_logistics_rate
    }

    pub fn validate(&self) -> AtjResult<()> {
        if let Some(m) = self.big_m {
            if !(m.is_finite() && m > 0.0) {
                return Err(AtjError::invalid(
                    "market.big_m",
                    format!("must be positive, got {}", m),
                ));
            }
        }
        if !(self.reference_flow.is_finite() && self.reference_flow > 0.0) {
            return Err(AtjError::Formulation(format!(
                "reference flow must be positive, got {}",
                self.reference_flow
            )));
        }
        if !(self.amortization.is_finite() && self.amortization > 0.0) {
            return Err(AtjError::Formulation(format!(
                "amortization divisor must be positive, got {}",
                self.amortization
            )));
        }
        let non_negative = [
            ("market.capex_exponent", self.capex_exponent),
            ("market.min_sugar_fraction", self.min_sugar_fraction),
            ("market.min_ethanol_fraction", self.min_ethanol_fraction),
            ("market.reference_capex", self.reference_capex),
            ("market.logistics_rate", self.logistics_rate),
            ("market.fixed_logistics_rate", self.fixed_logistics_rate),
            ("market.ethanol_energy", self.ethanol_energy),
            ("market.gasoline_energy", self.gasoline_energy),
            ("market.sugar_demand", self.sugar_demand),
            ("market.ground_demand", self.ground_demand),
            ("market.corn_ethanol_cap", self.corn_ethanol_cap),
            ("market.greenfield_opex_airport", self.greenfield_opex_airport),
            ("market.greenfield_opex_refinery", self.greenfield_opex_refinery),
            ("market.min_saf_size_mill", self.min_saf_size_mill),
            ("market.min_saf_size_airport", self.min_saf_size_airport),
            ("market.min_saf_size_refinery", self.min_saf_size_refinery),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AtjError::invalid(
                    key,
                    format!("must be non-negative, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Sparse patch applied to a base [`Policy`] and [`MarketParameters`].
///
/// Every field left `None` keeps the base value. Investment fixes are
/// appended after the base fixes, so a later fix for the same entity wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saf_premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_saf_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<ObjectiveMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greenfield_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blending: Option<BlendingPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incentives: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub investment_fixes: Vec<InvestmentFix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_capex: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logistics_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_logistics_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_demand: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_demand: Option<f64>,
}

impl ParameterOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ParameterOverrides::default()
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merged(&self, other: &ParameterOverrides) -> ParameterOverrides {
        let mut fixes = self.investment_fixes.clone();
        fixes.extend(other.investment_fixes.iter().cloned());
        ParameterOverrides {
            saf_premium: other.saf_premium.or(self.saf_premium),
            eth_premium: other.eth_premium.or(self.eth_premium),
            blend: other.blend.or(self.blend),
            max_saf_capacity: other.max_saf_capacity.or(self.max_saf_capacity),
            breakpoints: other.breakpoints.or(self.breakpoints),
            objective: other.objective.or(self.objective),
            greenfield_factor: other.greenfield_factor.or(self.greenfield_factor),
            blending: other.blending.or(self.blending),
            incentives: other.incentives.or(self.incentives),
            investment_fixes: fixes,
            big_m: other.big_m.or(self.big_m),
            reference_capex: other.reference_capex.or(self.reference_capex),
            logistics_rate: other.logistics_rate.or(self.logistics_rate),
            fixed_logistics_rate: other.fixed_logistics_rate.or(self.fixed_logistics_rate),
            sugar_demand: other.sugar_demand.or(self.sugar_demand),
            ground_demand: other.ground_demand.or(self.ground_demand),
        }
    }

    /// Return patched copies; the inputs are left untouched.
    pub fn apply(
        &self,
        policy: &Policy,
        market: &MarketParameters,
    ) -> (Policy, MarketParameters) {
        let mut policy = policy.clone();
        let mut market = market.clone();

        if let Some(v) = self.saf_premium {
            policy.saf_premium = v;
        }
        if let Some(v) = self.eth_premium {
            policy.eth_premium = v;
        }
        if let Some(v) = self.blend {
            policy.blend = v;
        }
        if let Some(v) = self.max_saf_capacity {
            policy.max_saf_capacity = v;
        }
        if let Some(v) = self.breakpoints {
            policy.breakpoints = v;
        }
        if let Some(v) = self.objective {
            policy.objective = v;
        }
        if let Some(v) = self.greenfield_factor {
            policy.greenfield_factor = v;
        }
        if let Some(v) = self.blending {
            policy.blending = v;
        }
        if let Some(v) = self.incentives {
            policy.incentives = v;
        }
        policy
            .investment_fixes
            .extend(self.investment_fixes.iter().cloned());

        if self.big_m.is_some() {
            market.big_m = self.big_m;
        }
        if let Some(v) = self.reference_capex {
            market.reference_capex = v;
        }
        if let Some(v) = self.logistics_rate {
            market.logistics_rate = v;
        }
        if let Some(v) = self.fixed_logistics_rate {
            market.fixed_logistics_rate = v;
        }
        if let Some(v) = self.sugar_demand {
            market.sugar_demand = v;
        }
        if let Some(v) = self.ground_demand {
            market.ground_demand = v;
        }

        (policy, market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_validation() {
        assert!(Policy::default().validate().is_ok());

        let err = Policy::new(0.2, 100.0).with_breakpoints(1).validate().unwrap_err();
        assert!(matches!(err, AtjError::Formulation(_)));
        assert!(err.to_string().contains("breakpoints"));

        assert!(Policy::new(1.5, 100.0).validate().is_err());
        assert!(Policy::new(0.2, 0.0).validate().is_err());
        assert!(Policy::new(0.2, 100.0).with_greenfield_factor(-0.1).validate().is_err());
    }

    #[test]
    fn test_capex_markup_by_tier() {
        let policy = Policy::default().with_greenfield_factor(0.5);
        assert_eq!(policy.capex_markup(Tier::Mill), 1.0);
        assert_eq!(policy.capex_markup(Tier::Airport), 1.5);
        assert_eq!(policy.capex_markup(Tier::Refinery), 1.5);
    }

    #[test]
    fn test_market_defaults() {
        let market = MarketParameters::default();
        assert!(market.validate().is_ok());
        assert_eq!(market.min_saf_size(Tier::Mill), 28_008.0);
        assert_eq!(market.min_saf_size(Tier::Refinery), 28_000.0);
        assert!((market.unit_logistics_cost(100.0) - 33.82).abs() < 1e-9);
    }

    #[test]
    fn test_market_rejects_non_positive_reference_flow() {
        let market = MarketParameters {
            reference_flow: 0.0,
            ..MarketParameters::default()
        };
        assert!(matches!(market.validate(), Err(AtjError::Formulation(_))));
    }

    #[test]
    fn test_investment_fix_parsing() {
        let fix: InvestmentFix = "airport=false".parse().unwrap();
        assert_eq!(fix, InvestmentFix::tier(Tier::Airport, false));

        let fix: InvestmentFix = "mill:Usina A=true".parse().unwrap();
        assert_eq!(fix, InvestmentFix::entity(Tier::Mill, "Usina A", true));

        assert!("mill".parse::<InvestmentFix>().is_err());
        assert!("mill=maybe".parse::<InvestmentFix>().is_err());
        assert!("harbour=true".parse::<InvestmentFix>().is_err());
    }

    #[test]
    fn test_overrides_apply_and_merge() {
        let base = ParameterOverrides {
            blend: Some(0.1),
            saf_premium: Some(100.0),
            ..Default::default()
        };
        let point = ParameterOverrides {
            blend: Some(0.3),
            investment_fixes: vec![InvestmentFix::tier(Tier::Refinery, false)],
            ..Default::default()
        };
        let merged = base.merged(&point);
        assert_eq!(merged.blend, Some(0.3));
        assert_eq!(merged.saf_premium, Some(100.0));

        let (policy, market) = merged.apply(&Policy::default(), &MarketParameters::default());
        assert_eq!(policy.blend, 0.3);
        assert_eq!(policy.saf_premium, 100.0);
        assert_eq!(policy.investment_fixes.len(), 1);
        assert_eq!(market, MarketParameters::default());
        assert!(!merged.is_empty());
        assert!(ParameterOverrides::default().is_empty());
    }

    #[test]
    fn test_objective_mode_parsing() {
        assert_eq!("Cost".parse::<ObjectiveMode>().unwrap(), ObjectiveMode::Cost);
        assert_eq!(
            "refinery-only".parse::<BlendingPolicy>().unwrap(),
            BlendingPolicy::RefineryOnly
        );
        assert!("revenue".parse::<ObjectiveMode>().is_err());
    }
}
