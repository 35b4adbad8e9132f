//! Shared loading of case files and base parameters.

use anyhow::{Context, Result};
use atj_algo::{MarketParameters, Policy};
use atj_cli::cli::ParamArgs;
use atj_core::CaseData;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// On-disk shape of `--params`; either section may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParamsFile {
    policy: Policy,
    market: MarketParameters,
}

pub fn load_case(path: &Path) -> Result<CaseData> {
    CaseData::load(path).with_context(|| format!("loading case '{}'", path.display()))
}

/// Params file (or defaults) with the command line flags applied on top.
pub fn resolve_params(args: &ParamArgs) -> Result<(Policy, MarketParameters)> {
    let base = match &args.params_file {
        Some(path) => load_params_file(path)?,
        None => ParamsFile::default(),
    };
    let overrides = args.overrides();
    if !overrides.is_empty() {
        debug!(?overrides, "applying command line overrides");
    }
    Ok(overrides.apply(&base.policy, &base.market))
}

fn load_params_file(path: &Path) -> Result<ParamsFile> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading params '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing params json")
        }
        _ => serde_yaml::from_str(&data).context("parsing params yaml"),
    }
}
