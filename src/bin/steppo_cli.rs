use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use steppo::config::AppConfig;
use steppo::engine::{ReplayBackend, TrackerHandle};
use steppo::fixtures::{
    synthetic_walk, ExpectationDiff, FixtureCatalog, FixtureReport, FixtureRunner,
};
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Parser, Debug)]
#[command(
    name = "steppo_cli",
    about = "Deterministic step tracking fixture harness for Steppo"
)]
struct Cli {
    /// Override directory containing fixture scripts (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Log level for stderr output
    #[arg(long, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a fixture script and optionally compare against expectations
    Run {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a fixture's readings through a paced sensor and print snapshots
    Stream {
        #[arg(long)]
        fixture: String,
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
    /// Generate a synthetic walking session and run it
    Simulate {
        #[arg(long, default_value_t = 20)]
        readings: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Initial counter value; the walk must stay at or below 2^24 (f32-exact)
        #[arg(long, default_value_t = 10_000)]
        start_count: u64,
        #[arg(long, default_value_t = 5)]
        max_burst: u32,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_platform();
    config.logging.level = cli.log_level.clone();
    steppo::logging::init_logging(&config.logging);

    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Run {
            fixture,
            expect,
            output,
        } => run_fixture(&catalog, config, &fixture, expect, output),
        Commands::Stream {
            fixture,
            interval_ms,
        } => run_stream(&catalog, config, &fixture, interval_ms),
        Commands::Simulate {
            readings,
            seed,
            start_count,
            max_burst,
        } => run_simulate(config, readings, seed, start_count, max_burst),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_fixture(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, override_expect)?;
    let report = FixtureRunner::new(config)
        .run(&data.metadata.name, &data.script)
        .with_context(|| format!("running fixture {}", fixture))?;

    emit_report(&report, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&report) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(
    catalog: &FixtureCatalog,
    mut config: AppConfig,
    fixture: &str,
    interval_ms: u64,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, None)?;
    let observations = data.script.observations();
    // Every reading may publish once, plus start and stop
    config.channels.snapshot_buffer = config
        .channels
        .snapshot_buffer
        .max(observations.len() + 2);

    let backend = Arc::new(ReplayBackend::new(
        observations,
        Duration::from_millis(interval_ms),
    ));
    let tracker = TrackerHandle::with_config(config, backend.clone());
    let mut snapshots = tracker.subscribe_snapshots()?;

    tracker.start_tracking()?;
    let timeout =
        Duration::from_millis(interval_ms.saturating_mul(backend.len() as u64) + 5_000);
    if !backend.wait_until_finished(timeout) {
        log::warn!("[steppo_cli] Replay did not finish within {:?}", timeout);
    }
    tracker.stop_tracking()?;

    loop {
        match snapshots.try_recv() {
            Ok(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
            Err(TryRecvError::Lagged(skipped)) => {
                log::warn!("[steppo_cli] Skipped {} snapshots", skipped);
            }
            Err(_) => break,
        }
    }

    Ok(ExitCode::from(0))
}

fn run_simulate(
    config: AppConfig,
    readings: usize,
    seed: u64,
    start_count: u64,
    max_burst: u32,
) -> Result<ExitCode> {
    let script = synthetic_walk(seed, start_count, readings, max_burst)?;
    let report = FixtureRunner::new(config).run(&format!("synthetic-{seed}"), &script)?;
    emit_report(&report, None)?;
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(report: &FixtureReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}
