use anyhow::Result;
use atj_algo::Registry;
use atj_core::MillKind;
use std::path::Path;
use tracing::info;

use super::params::load_case;

pub fn handle(case_path: &Path) -> Result<()> {
    info!("Validating case {}", case_path.display());
    let case = load_case(case_path)?;
    let registry = Registry::resolve(&case)?;

    let count_kind = |kind: MillKind| registry.mills.values().filter(|m| m.kind == kind).count();
    println!(
        "Case OK: {} mills ({} annexed, {} ethanol-only), {} airports, {} refineries",
        registry.mills.len(),
        count_kind(MillKind::Annexed),
        count_kind(MillKind::EthanolOnly),
        registry.airports.len(),
        registry.refineries.len(),
    );
    println!("Total jet fuel demand: {:.2} m3", registry.total_demand());
    print!("{}", registry.diagnostics);
    Ok(())
}
