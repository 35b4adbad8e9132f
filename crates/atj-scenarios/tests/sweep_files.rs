use atj_algo::test_utils::{small_case, small_market, small_policy};
use atj_algo::MilpSolverKind;
use atj_core::CaseData;
use atj_scenarios::*;

const SWEEP_YAML: &str = r#"
case_file: case.json
defaults:
  overrides:
    eth_premium: 0.0
grid:
  blend: [0.0, 0.2]
"#;

#[test]
fn sweep_from_files_writes_manifest_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let case_path = dir.path().join("case.json");
    small_case().save_json(&case_path).unwrap();
    let spec_path = dir.path().join("sweep.yaml");
    std::fs::write(&spec_path, SWEEP_YAML).unwrap();

    let set = load_spec_from_path(&spec_path).unwrap();
    let case = CaseData::load(&dir.path().join(set.case_file.as_deref().unwrap())).unwrap();
    let points = resolve_points(&set).unwrap();
    assert_eq!(points.len(), 2);

    let config = SweepConfig {
        policy: small_policy(0.0),
        market: small_market(),
        solver: MilpSolverKind::Microlp,
    };
    let summary = run_sweep(&case, &points, &config);
    assert_eq!(summary.optimal, 2);

    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let reports = write_point_reports(&out, &summary).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(out.join("blend_0.2").join("report.json").exists());

    let manifest_path = out.join("sweep_manifest.json");
    let manifest = SweepManifest::from_summary(&summary, set.case_file.clone(), "microlp");
    write_sweep_manifest(&manifest_path, &manifest).unwrap();
    let parsed = load_sweep_manifest(&manifest_path).unwrap();
    assert_eq!(parsed.points, summary.records());
}

#[test]
fn sweep_leaves_base_inputs_untouched() {
    let case = small_case();
    let config = SweepConfig {
        policy: small_policy(0.0),
        market: small_market(),
        solver: MilpSolverKind::Microlp,
    };
    let set: SweepSet = serde_yaml::from_str(SWEEP_YAML).unwrap();
    let points = resolve_points(&set).unwrap();

    let first = run_sweep(&case, &points, &config);
    let second = run_sweep(&case, &points, &config);
    assert_eq!(case, small_case());
    assert_eq!(config.policy, small_policy(0.0));
    for (a, b) in first.records().iter().zip(second.records()) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.objective_value, b.objective_value);
    }
}
