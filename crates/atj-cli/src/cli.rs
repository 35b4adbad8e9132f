use atj_algo::{
    BlendingPolicy, InvestmentFix, MilpSolverKind, ObjectiveMode, ParameterOverrides, FLOW_EPSILON,
};
use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "atj", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a case file and report diagnostics
    Validate {
        /// Case file (JSON or YAML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// Build the model and print its size without solving
    Build {
        /// Case file (JSON or YAML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Build and solve a single case
    Solve {
        /// Case file (JSON or YAML)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// MILP backend
        #[arg(long, default_value = "microlp")]
        solver: MilpSolverKind,
        /// Write the full solve report as JSON
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Write one volume CSV and one connection CSV per lane
        #[arg(long, value_hint = ValueHint::DirPath)]
        flows_dir: Option<PathBuf>,
        /// Volumes at or below this are reported as no flow
        #[arg(long, default_value_t = FLOW_EPSILON)]
        threshold: f64,
    },
    /// Run a parameter sweep from a YAML/JSON sweep spec
    Sweep {
        /// Sweep spec file
        #[arg(value_hint = ValueHint::FilePath)]
        spec: PathBuf,
        /// Case file; defaults to the spec's `case_file`, relative to the spec
        #[arg(long, value_hint = ValueHint::FilePath)]
        case: Option<PathBuf>,
        /// Output directory for the manifest, summary and per-point reports
        #[arg(long, value_hint = ValueHint::DirPath)]
        out_dir: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// MILP backend
        #[arg(long, default_value = "microlp")]
        solver: MilpSolverKind,
    },
}

/// Base policy and market inputs shared by `build`, `solve` and `sweep`.
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// YAML or JSON file with `policy` and `market` sections
    #[arg(long = "params", value_hint = ValueHint::FilePath)]
    pub params_file: Option<PathBuf>,
    /// Minimum SAF share of each airport's jet fuel supply (0..=1)
    #[arg(long)]
    pub blend: Option<f64>,
    /// Upper bound on any single SAF plant (m3)
    #[arg(long)]
    pub max_saf_capacity: Option<f64>,
    /// Premium on SAF sold by mills
    #[arg(long)]
    pub saf_premium: Option<f64>,
    /// Premium on ethanol sold for conversion
    #[arg(long)]
    pub eth_premium: Option<f64>,
    /// Breakpoints of the CAPEX curve
    #[arg(long)]
    pub breakpoints: Option<usize>,
    /// Objective: profit or cost
    #[arg(long)]
    pub objective: Option<ObjectiveMode>,
    /// Blending policy: airport-or-refinery or refinery-only
    #[arg(long)]
    pub blending: Option<BlendingPolicy>,
    /// CAPEX markup of greenfield airport and refinery plants
    #[arg(long)]
    pub greenfield_factor: Option<f64>,
    /// Enable SAF incentive variables
    #[arg(long)]
    pub incentives: bool,
    /// Pin an investment decision, e.g. `airport=false` or `mill:Usina A=true`
    #[arg(long = "fix", value_name = "TIER[:ENTITY]=BOOL")]
    pub fixes: Vec<InvestmentFix>,
    /// Override the disjunction big-M
    #[arg(long)]
    pub big_m: Option<f64>,
}

impl ParamArgs {
    /// Command line flags as a sparse patch over the params file.
    pub fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            saf_premium: self.saf_premium,
            eth_premium: self.eth_premium,
            blend: self.blend,
            max_saf_capacity: self.max_saf_capacity,
            breakpoints: self.breakpoints,
            objective: self.objective,
            greenfield_factor: self.greenfield_factor,
            blending: self.blending,
            incentives: self.incentives.then_some(true),
            investment_fixes: self.fixes.clone(),
            big_m: self.big_m,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atj_core::Tier;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_solve_flags_into_overrides() {
        let cli = Cli::try_parse_from([
            "atj",
            "solve",
            "case.json",
            "--blend",
            "0.1",
            "--objective",
            "cost",
            "--blending",
            "refinery-only",
            "--fix",
            "airport=false",
            "--fix",
            "mill:Usina A=true",
            "--incentives",
        ])
        .unwrap();
        let Some(Commands::Solve { params, solver, .. }) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(solver, MilpSolverKind::Microlp);

        let overrides = params.overrides();
        assert_eq!(overrides.blend, Some(0.1));
        assert_eq!(overrides.objective, Some(ObjectiveMode::Cost));
        assert_eq!(overrides.blending, Some(BlendingPolicy::RefineryOnly));
        assert_eq!(overrides.incentives, Some(true));
        assert_eq!(
            overrides.investment_fixes,
            vec![
                InvestmentFix::tier(Tier::Airport, false),
                InvestmentFix::entity(Tier::Mill, "Usina A", true),
            ]
        );
    }

    #[test]
    fn rejects_bad_fix_syntax() {
        let res = Cli::try_parse_from(["atj", "build", "case.json", "--fix", "airport"]);
        assert!(res.is_err());
    }
}
