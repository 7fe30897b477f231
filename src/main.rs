use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use network_flow_optimizer::{telemetry, Config, ScenarioEngine, ScenarioFailure, ScenarioReport};
use tracing::{info, warn};

/// Solve the distribution network for one or more scenarios and print JSON reports
#[derive(Debug, Parser)]
#[command(name = "network-flow-optimizer", version, about)]
struct Cli {
    /// Extra TOML file layered over config/default.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory with plants.csv, distribution_centers.csv, markets.csv, transportation.csv
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Run baseline, cost_optimized and disruption in order
    #[arg(long, conflicts_with = "scenarios")]
    all: bool,

    /// Scenarios to run, in order (baseline, cost_optimized, disruption)
    #[arg(value_name = "SCENARIO")]
    scenarios: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        cfg.data.dir = dir;
    }

    let engine = ScenarioEngine::from_config(&cfg)
        .with_context(|| format!("failed to load network from {}", cfg.data.dir.display()))?;
    info!(
        data_dir = %cfg.data.dir.display(),
        plants = engine.network().plants().len(),
        distribution_centers = engine.network().distribution_centers().len(),
        markets = engine.network().markets().len(),
        routes = engine.network().routes().len(),
        "engine ready"
    );

    let results = if cli.all || cli.scenarios.is_empty() {
        engine.run_all().await
    } else {
        let mut results = Vec::with_capacity(cli.scenarios.len());
        for raw in &cli.scenarios {
            results.push(engine.run_named(raw).await);
        }
        results
    };

    let (reports, failures): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let reports: Vec<ScenarioReport> = reports.into_iter().filter_map(Result::ok).collect();
    let mut failures: Vec<ScenarioFailure> = failures.into_iter().filter_map(Result::err).collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);

    for failure in failures.iter().skip(1) {
        warn!(scenario = %failure.scenario, kind = failure.source.kind(), "additional scenario failure");
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow::Error::new(failures.swap_remove(0)))
    }
}
