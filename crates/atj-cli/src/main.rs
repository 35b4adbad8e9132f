use atj_cli::cli::{Cli, Commands};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let Some(command) = &cli.command else {
        info!("No command given; run `atj --help` for usage");
        return;
    };

    let (label, result) = match command {
        Commands::Validate { case } => ("validate", commands::validate::handle(case)),
        Commands::Build { case, params } => ("build", commands::build::handle(case, params)),
        Commands::Solve {
            case,
            params,
            solver,
            out,
            flows_dir,
            threshold,
        } => (
            "solve",
            commands::solve::handle(
                case,
                params,
                *solver,
                out.as_deref(),
                flows_dir.as_deref(),
                *threshold,
            ),
        ),
        Commands::Sweep {
            spec,
            case,
            out_dir,
            params,
            solver,
        } => (
            "sweep",
            commands::sweep::handle(spec, case.as_deref(), out_dir, params, *solver),
        ),
    };

    if let Err(e) = result {
        error!("{} failed: {:?}", label, e);
        std::process::exit(1);
    }
}
