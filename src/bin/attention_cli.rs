use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use attention_tracker::config::AppConfig;
use attention_tracker::engine::{
    AttentionTracker, IntervalFrameClock, SimulationOptions, SystemTimeSource, TrackerBackends,
};
use attention_tracker::fixtures::{FixtureCatalog, FixtureProcessor, ReplayReport};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "attention_cli",
    about = "Deterministic landmark fixture harness and live simulator for the attention tracker"
)]
struct Cli {
    /// Override directory containing fixture recordings (defaults to fixtures/)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON configuration file (defaults to assets/attention_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a landmark fixture and print the session report
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Exit with code 2 unless the session average equals this value
        #[arg(long)]
        expect_average: Option<u8>,
    },
    /// Run a live session against a simulated camera and synthetic face
    Simulate {
        #[arg(long, default_value_t = 90)]
        frames: u64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Maximum per-frame head movement
        #[arg(long, default_value_t = 0.02)]
        drift: f64,
        /// Probability that a frame has no face
        #[arg(long, default_value_t = 0.05)]
        absence_rate: f64,
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
    init_logging(cli.verbose);

    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            output,
            expect_average,
        } => run_replay(&catalog, config, &fixture, output, expect_average),
        Commands::Simulate {
            frames,
            seed,
            drift,
            absence_rate,
        } => {
            if !drift.is_finite() || !absence_rate.is_finite() {
                bail!("--drift and --absence-rate must be finite numbers");
            }
            let options = SimulationOptions {
                seed,
                drift,
                absence_rate,
                ..SimulationOptions::default()
            };
            run_simulate(config, options, frames)
        }
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_replay(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixture: &str,
    output_path: Option<PathBuf>,
    expect_average: Option<u8>,
) -> Result<ExitCode> {
    let data = catalog.load(fixture)?;
    let report = FixtureProcessor::new(config)
        .run(&data)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    emit_report(&report, output_path)?;

    match expect_average {
        Some(expected) if report.summary.average != Some(expected) => {
            let diff = serde_json::json!({
                "fixture": report.fixture,
                "expected_average": expected,
                "actual_average": report.summary.average,
            });
            eprintln!("{}", serde_json::to_string_pretty(&diff)?);
            Ok(ExitCode::from(2))
        }
        _ => Ok(ExitCode::from(0)),
    }
}

fn run_simulate(config: AppConfig, options: SimulationOptions, frames: u64) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building simulation runtime")?;

    runtime.block_on(async move {
        let clock = IntervalFrameClock::new(config.scheduler.frame_rate_hz);
        let mut ticker = clock.ticker();
        let backends = TrackerBackends::simulated(
            options,
            Arc::new(clock),
            Arc::new(SystemTimeSource::default()),
        );
        let tracker = AttentionTracker::new(config, backends);
        let mut ticks = tracker.subscribe_ticks();

        tracker.start().await.context("starting simulated session")?;

        let pump = tracker.run(&mut ticker, Some(frames));
        tokio::pin!(pump);
        let delivered = loop {
            tokio::select! {
                delivered = &mut pump => break delivered,
                Ok(report) = ticks.recv() => println!("{}", serde_json::to_string(&report)?),
            }
        };
        while let Ok(report) = ticks.try_recv() {
            println!("{}", serde_json::to_string(&report)?);
        }
        tracker.stop();

        let summary = SimulationSummary {
            frames_delivered: delivered,
            summary: tracker.session_summary(),
        };
        println!("{}", serde_json::to_string(&summary)?);
        Ok::<_, anyhow::Error>(ExitCode::from(0))
    })
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        println!("{} -> {}", metadata.name, metadata.path.display());
    }
    Ok(ExitCode::from(0))
}

fn emit_report(report: &ReplayReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct SimulationSummary {
    frames_delivered: u64,
    summary: attention_tracker::engine::SessionSummary,
}
