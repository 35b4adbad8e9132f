pub mod manifest;
pub mod runner;
pub mod spec;

pub use manifest::{load_sweep_manifest, write_point_reports, write_sweep_manifest, SweepManifest};
pub use runner::{run_point, run_sweep, SweepConfig, SweepOutcome, SweepRecord, SweepSummary};
pub use spec::{
    load_spec_from_path, resolve_points, validate, ResolvedPoint, SweepDefaults, SweepPointSpec,
    SweepSet, GRID_AXES,
};
