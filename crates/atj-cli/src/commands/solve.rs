use anyhow::{Context, Result};
use atj_algo::{FlowMatrix, MilpSolverKind, SolveReport, SupplyChainModel};
use atj_cli::cli::ParamArgs;
use std::fs::{self, File};
use std::path::Path;
use tracing::{info, warn};

use super::params::{load_case, resolve_params};

pub fn handle(
    case_path: &Path,
    args: &ParamArgs,
    solver: MilpSolverKind,
    out: Option<&Path>,
    flows_dir: Option<&Path>,
    threshold: f64,
) -> Result<()> {
    let case = load_case(case_path)?;
    let (policy, market) = resolve_params(args)?;
    let model = SupplyChainModel::build(&case, &policy, &market).context("building model")?;
    for issue in model.diagnostics().iter() {
        warn!("{}", issue);
    }

    info!(
        "Solving {} ({} variables, {} constraints) with {}",
        case_path.display(),
        model.num_variables(),
        model.num_constraints(),
        solver
    );
    let report = model.solve(solver);
    println!("Status: {}", report.status);
    println!("Solve time: {:.1} ms", report.solve_time.as_secs_f64() * 1000.0);

    if let Some(solution) = &report.solution {
        print!("{}", solution.summary());
        if let Some(dir) = flows_dir {
            write_flow_tables(dir, &solution.flows, threshold)?;
            println!("Flow tables written to {}", dir.display());
        }
    } else if flows_dir.is_some() {
        warn!("no solution; skipping flow tables");
    }

    if let Some(path) = out {
        write_report(path, &report)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn write_report(path: &Path, report: &SolveReport) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating report '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("writing report '{}'", path.display()))?;
    Ok(())
}

/// Two CSVs per lane: `<lane>.csv` with volumes and `<lane>_connections.csv`
/// with 0/1 entries, both with origins as rows and destinations as columns.
pub fn write_flow_tables(dir: &Path, flows: &[FlowMatrix], threshold: f64) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating flow directory '{}'", dir.display()))?;
    for matrix in flows {
        let lane = matrix.lane.as_str();
        let volumes = matrix.thresholded(threshold);
        write_matrix(&dir.join(format!("{}.csv", lane)), matrix, |o, d| {
            volumes.get(o, d).to_string()
        })?;

        let connections = matrix.connections(threshold);
        write_matrix(
            &dir.join(format!("{}_connections.csv", lane)),
            matrix,
            |o, d| u8::from(connections[o][d]).to_string(),
        )?;
    }
    Ok(())
}

fn write_matrix(
    path: &Path,
    matrix: &FlowMatrix,
    cell: impl Fn(usize, usize) -> String,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating flow table '{}'", path.display()))?;
    let mut header = vec!["origin".to_string()];
    header.extend(matrix.destinations.iter().cloned());
    writer.write_record(&header)?;
    for (o, origin) in matrix.origins.iter().enumerate() {
        let mut row = vec![origin.clone()];
        row.extend((0..matrix.destinations.len()).map(|d| cell(o, d)));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
