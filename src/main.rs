use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tender_sweep::{Config, Harvester, run_with_shutdown};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tender-sweep",
    about = "Sweep a tender-notice portal for bill-of-quantities documents",
    version
)]
struct Args {
    /// JSON configuration file; missing keys take their defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// First (highest) identifier to visit
    #[arg(long)]
    anchor: Option<u64>,

    /// Number of identifiers below the anchor to visit
    #[arg(long)]
    window: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "tender-sweep failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> tender_sweep::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(anchor) = args.anchor {
        config.sweep.anchor_id = anchor;
    }
    if let Some(window) = args.window {
        config.sweep.window = window;
    }
    config.validate()?;

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting tender-sweep");
    let harvester = Harvester::new(config)?;
    let report = run_with_shutdown(&harvester).await;

    info!(
        outcome = %report.outcome,
        processed = report.processed,
        productive = report.productive,
        misses = report.misses,
        faults = report.faults,
        captures = report.captures,
        tables = report.tables,
        pruned_bytes = report.pruned_bytes,
        last_id = report.last_id.as_deref().unwrap_or("-"),
        "sweep report"
    );
    Ok(())
}
