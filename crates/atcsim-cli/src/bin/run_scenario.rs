//! Scenario runner - drive traffic through the conflict engine.
//!
//! Runs one of the canned scenarios (or seeded random traffic) at a fixed
//! tick rate, logging conflicts as they start and printing a summary.
//!
//! Usage:
//!   cargo run -p atcsim-cli --bin run_scenario -- --scenario crossing
//!   cargo run -p atcsim-cli --bin run_scenario -- --scenario random --count 40 --seed 7 --json

use anyhow::{Context, Result};
use atcsim_cli::sim::{
    create_collision_scenario, create_crossing_scenario, create_head_on_scenario,
    create_parallel_ils_scenario, create_random_scenario, create_runway_scenario, run_scenario,
    RunOptions, Scenario,
};
use atcsim_cli::Config;
use atcsim_core::{AirportLayout, ScoringRules, SeparationRules};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenarioKind {
    HeadOn,
    Crossing,
    ParallelIls,
    Runway,
    Collision,
    Random,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a traffic scenario through the conflict engine")]
struct Args {
    /// Scenario to run
    #[arg(long, value_enum, default_value = "crossing")]
    scenario: ScenarioKind,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 300)]
    ticks: u32,

    /// Seconds per tick (overrides ATCSIM_TICK_SECS)
    #[arg(long)]
    tick_secs: Option<f64>,

    /// Aircraft count for the random scenario
    #[arg(long, default_value_t = 30)]
    count: usize,

    /// Seed for the random scenario
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// JSON separation rules file (overrides ATCSIM_RULES)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON airport layout replacing the scenario's default field (overrides ATCSIM_AIRPORT)
    #[arg(long)]
    airport: Option<PathBuf>,

    /// Print per-tick conflict reports and the summary as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn build_scenario(args: &Args) -> Result<Scenario> {
    let scenario = match args.scenario {
        ScenarioKind::HeadOn => create_head_on_scenario()?,
        ScenarioKind::Crossing => create_crossing_scenario()?,
        ScenarioKind::ParallelIls => create_parallel_ils_scenario()?,
        ScenarioKind::Runway => create_runway_scenario()?,
        ScenarioKind::Collision => create_collision_scenario()?,
        ScenarioKind::Random => create_random_scenario(args.count, args.seed)?,
    };
    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_new(&config.log_filter).context("invalid ATCSIM_LOG filter")?)
        .init();

    let rules = match args.rules.as_ref().or(config.rules_path.as_ref()) {
        Some(path) => SeparationRules::from_path(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => SeparationRules::default(),
    };
    rules.validate()?;

    let mut scenario = build_scenario(&args)?;
    if let Some(path) = args.airport.as_ref().or(config.airport_path.as_ref()) {
        scenario.layout = AirportLayout::from_path(path)
            .with_context(|| format!("loading airport from {}", path.display()))?;
    }

    let tick_secs = args.tick_secs.unwrap_or(config.tick_secs);
    anyhow::ensure!(
        tick_secs.is_finite() && tick_secs > 0.0,
        "tick length must be positive, got {tick_secs}"
    );

    let json = args.json;
    let summary = run_scenario(
        &scenario,
        rules,
        ScoringRules::default(),
        RunOptions {
            ticks: args.ticks,
            tick_secs,
        },
        |now, report| {
            if json && !report.is_empty() {
                match serde_json::to_string(&serde_json::json!({ "t": now, "conflicts": report })) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!("Failed to encode tick report: {}", e),
                }
            }
        },
    );

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("scenario:          {}", summary.scenario);
        println!("ticks:             {}", summary.ticks);
        println!("peak trackers:     {}", summary.peak_trackers);
        println!("separation losses: {}", summary.separation_losses);
        println!("runway conflicts:  {}", summary.runway_collisions);
        println!("collisions:        {}", summary.collisions);
        if !summary.hit.is_empty() {
            println!("hit:               {}", summary.hit.join(", "));
        }
        println!("score:             {}", summary.score);
    }

    Ok(())
}
