use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prompting_bench::cli::{Cli, Command};
use prompting_bench::config::{EnablementConfig, OpenBenchConfig};
use prompting_bench::measure::{self, report, MeasurementStore};
use prompting_bench::open_probe::OpenProbe;
use prompting_bench::rules::RuleCounts;
use prompting_bench::snapd::SnapCli;
use prompting_bench::{discovery, enablement, fixture, BenchError, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let open_cfg = cli.open_bench();
    match cli.command {
        None => match open_cfg {
            Some(cfg) => run_open_bench(cfg).await,
            None => Err(BenchError::InvalidConfig("missing FILE_OR_DIR".into())),
        },
        Some(Command::Enablement(args)) => {
            let cfg = EnablementConfig::from(args);
            cfg.validate()?;

            let pm = SnapCli::new(&cfg.snap_bin);
            let store = MeasurementStore::new();
            let summary = enablement::run(&pm, &cfg, &store).await?;
            info!(
                recorded = summary.recorded,
                failed = summary.failed,
                "Compute measurement statistics"
            );
            report::write_enablement_report(&mut io::stdout().lock(), &store)
                .map_err(|e| BenchError::io("<stdout>", e))?;
            Ok(())
        }
        Some(Command::Setup { dir, files, dirs }) => {
            fixture::setup_folder(&dir, files, dirs).map(drop)
        }
        Some(Command::Rules { path }) => {
            let counts = RuleCounts::load(&path)?;
            counts
                .write_to(&mut io::stdout().lock())
                .map_err(|e| BenchError::io("<stdout>", e))
        }
    }
}

async fn run_open_bench(cfg: OpenBenchConfig) -> Result<()> {
    cfg.validate()?;

    let store = Arc::new(MeasurementStore::new());
    let base = discovery::discover_into(&cfg.root, &store)?;

    info!("Starting measuring {} time(s)", cfg.passes);
    let summary =
        measure::run_passes(&store, &Arc::new(OpenProbe), cfg.passes, cfg.concurrency).await?;

    info!(
        recorded = summary.recorded,
        failed = summary.failed,
        "Compute measurement statistics"
    );
    report::write_file_report(&mut io::stdout().lock(), &store, &base)
        .map_err(|e| BenchError::io("<stdout>", e))?;
    Ok(())
}
