//! IRR/MOIC sensitivity sweep
//!
//! Evaluates the base configuration over a grid of monthly rents and mortgage
//! rates (or over named CSV scenarios) in parallel.
//! Supports JSON output for downstream tooling via --json.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use rental_projection::config::{load_config, load_scenarios, PropertyConfig};
use rental_projection::scenario::ScenarioRunner;

/// Sweep rent and mortgage rate around a base configuration
#[derive(Parser)]
#[command(name = "sensitivity", version, about)]
struct Cli {
    /// JSON base configuration (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monthly rents to evaluate, comma separated
    #[arg(long, value_delimiter = ',')]
    rents: Vec<f64>,

    /// Initial mortgage rates to evaluate, comma separated fractions
    #[arg(long, value_delimiter = ',')]
    rates: Vec<f64>,

    /// CSV of named overrides; replaces the rent/rate grid
    #[arg(long)]
    scenarios: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SensitivityPoint {
    scenario: String,
    monthly_rent: f64,
    mortgage_rate: f64,
    irr_pct: Option<f64>,
    moic: Option<f64>,
    /// Solver failure, if any
    error: Option<String>,
}

#[derive(Serialize)]
struct SensitivityResponse {
    point_count: usize,
    failed_count: usize,
    points: Vec<SensitivityPoint>,
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let base = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Unable to load configuration from {}", path.display()))?,
        None => PropertyConfig::default(),
    };
    base.validate().context("Invalid base configuration")?;
    let runner = ScenarioRunner::with_base(base);

    let named: Vec<(String, PropertyConfig)> = match &cli.scenarios {
        Some(path) => load_scenarios(path)
            .with_context(|| format!("Unable to load scenarios from {}", path.display()))?
            .iter()
            .map(|o| (o.name.clone(), o.apply(runner.base())))
            .collect(),
        None => grid_configs(&runner, &cli.rents, &cli.rates),
    };

    if !cli.json {
        println!("Running {} projections...", named.len());
    }

    let points: Vec<SensitivityPoint> = named
        .par_iter()
        .map(|(name, config)| {
            let (irr_pct, moic, error) = match runner.run(config) {
                Ok(result) => (Some(result.irr() * 100.0), Some(result.moic()), None),
                Err(e) => (None, None, Some(e.to_string())),
            };
            SensitivityPoint {
                scenario: name.clone(),
                monthly_rent: config.operating.monthly_rent,
                mortgage_rate: config.initial_mortgage.annual_rate,
                irr_pct,
                moic,
                error,
            }
        })
        .collect();

    let response = SensitivityResponse {
        point_count: points.len(),
        failed_count: points.iter().filter(|p| p.error.is_some()).count(),
        points,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "{:<20} {:>10} {:>8} {:>10} {:>8}",
        "Scenario", "Rent", "Rate%", "IRR%", "MOIC"
    );
    println!("{}", "-".repeat(60));
    for point in &response.points {
        match (point.irr_pct, point.moic) {
            (Some(irr), Some(moic)) => println!(
                "{:<20} {:>10.2} {:>8.3} {:>10.4} {:>8.4}",
                point.scenario,
                point.monthly_rent,
                point.mortgage_rate * 100.0,
                irr,
                moic
            ),
            _ => println!(
                "{:<20} {:>10.2} {:>8.3}   FAILED: {}",
                point.scenario,
                point.monthly_rent,
                point.mortgage_rate * 100.0,
                point.error.as_deref().unwrap_or("unknown")
            ),
        }
    }
    println!(
        "\n{} points, {} failed, in {} ms",
        response.point_count, response.failed_count, response.execution_time_ms
    );

    Ok(())
}

/// Cross product of rents and rates; an empty axis keeps the base value
fn grid_configs(runner: &ScenarioRunner, rents: &[f64], rates: &[f64]) -> Vec<(String, PropertyConfig)> {
    let base = runner.base();
    let rents = if rents.is_empty() { vec![base.operating.monthly_rent] } else { rents.to_vec() };
    let rates = if rates.is_empty() { vec![base.initial_mortgage.annual_rate] } else { rates.to_vec() };

    let mut configs = Vec::with_capacity(rents.len() * rates.len());
    for &rent in &rents {
        for &rate in &rates {
            let config = runner.base_with(|c| {
                c.operating.monthly_rent = rent;
                c.initial_mortgage.annual_rate = rate;
            });
            configs.push((format!("rent={rent} rate={rate}"), config));
        }
    }
    configs
}
