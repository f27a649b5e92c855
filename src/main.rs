//! Rental Projection CLI
//!
//! Runs a single projection from a JSON configuration (or the defaults) and
//! prints the equity summary, the full output record, or the yearly roll-up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use rental_projection::config::{load_config, PropertyConfig};
use rental_projection::projection::{ProjectionEngine, ProjectionResult, Tranche};

/// Project cash flows, debt and returns of a leveraged rental property
#[derive(Parser)]
#[command(name = "rental-projection", version, about)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full output record as JSON
    #[arg(long)]
    json: bool,

    /// Write one row per month to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the yearly roll-up
    #[arg(long)]
    annual: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Unable to load configuration from {}", path.display()))?,
        None => PropertyConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let result = ProjectionEngine::new(config)
        .run()
        .context("Projection failed")?;

    if let Some(path) = &cli.csv {
        write_rows(&result, path)?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_summary(&result);
    if cli.annual {
        print_annual(&result);
    }
    if let Some(path) = &cli.csv {
        println!("\nMonthly rows written to: {}", path.display());
    }

    Ok(())
}

fn write_rows(result: &ProjectionResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Unable to create {}", path.display()))?;
    for row in result.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(result: &ProjectionResult) {
    let su = &result.sources_uses;
    let summary = result.summary();

    println!("Rental Projection ({} months)", summary.total_months);
    println!("==============================\n");

    println!("Sources & Uses:");
    println!("  Purchase Price:      ${:>14.2}", su.purchase_price);
    println!("  Closing Costs:       ${:>14.2}", su.closing_costs);
    println!("  Origination Fees:    ${:>14.2}", su.origination_fees);
    println!("  Total Uses:          ${:>14.2}", su.total_uses);
    println!("  Initial Mortgage:    ${:>14.2}", su.initial_mortgage);
    println!("  Home Equity Loan:    ${:>14.2}", su.home_equity);
    println!("  Equity:              ${:>14.2}", su.equity);

    println!("\nEquity Summary:");
    println!("  Equity at Closing:   ${:>14.2}", summary.equity_at_closing);
    println!("  Additional Equity:   ${:>14.2}", summary.additional_equity);
    println!("  Total Invested:      ${:>14.2}", summary.total_equity_invested);
    println!("  Home Value at Sale:  ${:>14.2}", summary.home_value_at_sale);
    for tranche in Tranche::ALL {
        println!("  {:<20} ${:>14.2}", format!("{}:", tranche.label()), result.home_sale.balance(tranche));
    }
    println!("  Total Debt at Sale:  ${:>14.2}", summary.total_debt_at_sale);
    println!("  Sale Proceeds:       ${:>14.2}", summary.home_sale_proceeds);
    println!("  Rental Proceeds:     ${:>14.2}", summary.rental_proceeds_after_debt);
    println!("  Total Profit:        ${:>14.2}", summary.total_profit);
    println!("  IRR:                 {:>14.4}%", summary.irr * 100.0);
    println!("  MOIC:                {:>14.4}x", summary.moic);
}

fn print_annual(result: &ProjectionResult) {
    println!("\nYearly Roll-up:");
    println!(
        "{:>4} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Year", "Revenue", "Expenses", "Interest", "Principal", "LeveredFCF", "DebtBalance"
    );
    println!("{}", "-".repeat(84));

    for row in result.annual() {
        let expenses = row.insurance + row.hoa + row.property_tax + row.maintenance + row.management_fee;
        println!(
            "{:>4} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
            row.year,
            row.revenue,
            expenses,
            row.interest,
            row.principal,
            row.levered_fcf,
            row.ending_debt_balance
        );
    }
}
