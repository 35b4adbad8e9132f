use anyhow::{Context, Result};
use atj_algo::{ModelStats, SupplyChainModel};
use atj_cli::cli::ParamArgs;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;
use tracing::{info, warn};

use super::params::{load_case, resolve_params};

pub fn handle(case_path: &Path, args: &ParamArgs) -> Result<()> {
    let case = load_case(case_path)?;
    let (policy, market) = resolve_params(args)?;
    let model = SupplyChainModel::build(&case, &policy, &market).context("building model")?;
    for issue in model.diagnostics().iter() {
        warn!("{}", issue);
    }
    info!(
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        "model built"
    );
    print_stats(model.stats())
}

pub fn print_stats(stats: &ModelStats) -> Result<()> {
    println!(
        "Model: {} mills, {} airports, {} refineries, {} breakpoints, objective {}",
        stats.mills, stats.airports, stats.refineries, stats.breakpoints, stats.objective
    );

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "VARIABLES\tCOUNT")?;
    let v = &stats.variables;
    for (label, count) in [
        ("production", v.production),
        ("flows", v.flows),
        ("binaries", v.binaries),
        ("piecewise_weights", v.piecewise_weights),
        ("purchases", v.purchases),
        ("incentives", v.incentives),
        ("total", stats.num_variables()),
    ] {
        writeln!(writer, "{}\t{}", label, count)?;
    }
    writeln!(writer)?;
    writeln!(writer, "CONSTRAINT FAMILY\tROWS")?;
    for (family, rows) in &stats.constraints_by_family {
        writeln!(writer, "{}\t{}", family, rows)?;
    }
    writeln!(writer, "total\t{}", stats.constraints)?;
    writer.flush()?;
    Ok(())
}
