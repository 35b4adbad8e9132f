use anyhow::{anyhow, Context, Result};
use atj_algo::MilpSolverKind;
use atj_cli::cli::ParamArgs;
use atj_scenarios::{
    load_spec_from_path, resolve_points, run_sweep, write_point_reports, write_sweep_manifest,
    SweepConfig, SweepManifest, SweepRecord,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabwriter::TabWriter;
use tracing::info;

use super::params::{load_case, resolve_params};

pub fn handle(
    spec_path: &Path,
    case_override: Option<&Path>,
    out_dir: &Path,
    args: &ParamArgs,
    solver: MilpSolverKind,
) -> Result<()> {
    let set = load_spec_from_path(spec_path)?;
    let points = resolve_points(&set)?;
    let case_path = resolve_case_path(spec_path, case_override, set.case_file.as_deref())?;
    let case = load_case(&case_path)?;
    let (policy, market) = resolve_params(args)?;

    info!(
        "Sweeping {} points over {} with {}",
        points.len(),
        case_path.display(),
        solver
    );
    let config = SweepConfig {
        policy,
        market,
        solver,
    };
    let summary = run_sweep(&case, &points, &config);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;
    let reports = write_point_reports(out_dir, &summary)?;
    let records = summary.records();
    write_summary_csv(&out_dir.join("sweep_summary.csv"), &records)?;
    let manifest = SweepManifest::from_summary(
        &summary,
        Some(case_path.display().to_string()),
        solver.as_str(),
    );
    write_sweep_manifest(&out_dir.join("sweep_manifest.json"), &manifest)?;

    print_records(&records)?;
    println!(
        "{} optimal, {} failed; {} reports written to {}",
        summary.optimal,
        summary.failed,
        reports.len(),
        out_dir.display()
    );
    Ok(())
}

fn resolve_case_path(
    spec_path: &Path,
    case_override: Option<&Path>,
    spec_case: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = case_override {
        return Ok(path.to_path_buf());
    }
    let case =
        spec_case.ok_or_else(|| anyhow!("sweep spec has no case_file; pass one with --case"))?;
    let base = spec_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(case))
}

fn write_summary_csv(path: &Path, records: &[SweepRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating sweep summary '{}'", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_records(records: &[SweepRecord]) -> Result<()> {
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into());
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "POINT\tSTATUS\tOBJECTIVE\tSAF DELIVERED\tPLANTS")?;
    for record in records {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            record.point_id,
            record.status,
            fmt(record.objective_value),
            fmt(record.saf_delivered),
            record
                .investments
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".into()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_path_is_relative_to_spec() {
        let spec = Path::new("studies/sweep.yaml");
        let path = resolve_case_path(spec, None, Some("case.json")).unwrap();
        assert_eq!(path, Path::new("studies/case.json"));

        let explicit = resolve_case_path(spec, Some(Path::new("other.yaml")), Some("case.json"));
        assert_eq!(explicit.unwrap(), Path::new("other.yaml"));

        assert!(resolve_case_path(spec, None, None).is_err());
    }
}
