use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::runner::{SweepRecord, SweepSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepManifest {
    pub created_at: DateTime<Utc>,
    pub case_file: Option<String>,
    pub solver: String,
    pub num_points: usize,
    pub optimal: usize,
    pub failed: usize,
    pub points: Vec<SweepRecord>,
}

impl SweepManifest {
    pub fn from_summary(summary: &SweepSummary, case_file: Option<String>, solver: &str) -> Self {
        Self {
            created_at: Utc::now(),
            case_file,
            solver: solver.to_string(),
            num_points: summary.outcomes.len(),
            optimal: summary.optimal,
            failed: summary.failed,
            points: summary.records(),
        }
    }
}

pub fn write_sweep_manifest(path: &Path, manifest: &SweepManifest) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating sweep manifest '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, manifest)
        .with_context(|| format!("writing sweep manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_sweep_manifest(path: &Path) -> Result<SweepManifest> {
    let file =
        File::open(path).with_context(|| format!("opening sweep manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing sweep manifest '{}'", path.display()))
}

/// Write one `<point_id>/report.json` per point that produced a solve report.
///
/// ```text
/// out_dir/
///   <point_id>/
///     report.json
/// ```
pub fn write_point_reports(out_dir: &Path, summary: &SweepSummary) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for outcome in &summary.outcomes {
        let Some(report) = &outcome.report else {
            continue;
        };
        let dir = out_dir.join(sanitize_name(&outcome.point.point_id));
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating sweep point directory '{}'", dir.display()))?;
        let path = dir.join("report.json");
        let file = File::create(&path)
            .with_context(|| format!("creating point report '{}'", path.display()))?;
        serde_json::to_writer_pretty(file, report)
            .with_context(|| format!("writing point report '{}'", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn sanitize_name(value: &str) -> String {
    let filtered: String = value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ',' | '=' | ' ') { '_' } else { c })
        .collect();
    if filtered.is_empty() {
        "point".to_string()
    } else {
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_and_reads_manifest() {
        let summary = SweepSummary {
            optimal: 0,
            failed: 0,
            outcomes: Vec::new(),
        };
        let manifest = SweepManifest::from_summary(&summary, Some("case.yaml".into()), "microlp");
        let tmp = NamedTempFile::new().unwrap();
        write_sweep_manifest(tmp.path(), &manifest).unwrap();
        let parsed = load_sweep_manifest(tmp.path()).unwrap();
        assert_eq!(parsed.solver, "microlp");
        assert_eq!(parsed.case_file.as_deref(), Some("case.yaml"));
        assert_eq!(parsed.num_points, 0);
    }

    #[test]
    fn grid_ids_become_safe_directory_names() {
        assert_eq!(sanitize_name("blend=0.1,saf_premium=0"), "blend_0.1_saf_premium_0");
        assert_eq!(sanitize_name(""), "point");
    }
}
