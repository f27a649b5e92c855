//! File loaders for projection configurations
//!
//! A base configuration is a JSON document; scenario sweeps are CSV files where
//! each row names a scenario and overrides a handful of headline inputs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::Reader;
use serde::Deserialize;

use super::{LoanTerms, PropertyConfig, Refinance};
use crate::error::Result;

/// One row of a scenario CSV; empty cells keep the base value
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioOverride {
    #[serde(rename = "Scenario")]
    pub name: String,
    #[serde(rename = "PurchasePrice", default)]
    pub purchase_price: Option<f64>,
    #[serde(rename = "DownPayment", default)]
    pub down_payment_fraction: Option<f64>,
    #[serde(rename = "MonthlyRent", default)]
    pub monthly_rent: Option<f64>,
    #[serde(rename = "MortgageRate", default)]
    pub mortgage_rate: Option<f64>,
    #[serde(rename = "InvestmentYears", default)]
    pub investment_years: Option<u32>,
    #[serde(rename = "RefinanceMonth", default)]
    pub refinance_month: Option<u32>,
    #[serde(rename = "RefinanceRate", default)]
    pub refinance_rate: Option<f64>,
}

impl ScenarioOverride {
    /// Produce a new configuration with this row's overrides applied to `base`
    pub fn apply(&self, base: &PropertyConfig) -> PropertyConfig {
        let mut config = base.clone();

        if let Some(price) = self.purchase_price {
            config.purchase_price = price;
        }
        if let Some(fraction) = self.down_payment_fraction {
            config.down_payment_fraction = fraction;
        }
        if let Some(rent) = self.monthly_rent {
            config.operating.monthly_rent = rent;
        }
        if let Some(rate) = self.mortgage_rate {
            config.initial_mortgage.annual_rate = rate;
        }
        if let Some(years) = self.investment_years {
            config.investment_years = years;
        }

        // A refinance column on a base without one creates a refinance on the
        // initial mortgage's term
        if self.refinance_month.is_some() || self.refinance_rate.is_some() {
            let fallback = || Refinance {
                trigger_month: self.refinance_month.unwrap_or(0),
                loan: LoanTerms::new(
                    config.initial_mortgage.annual_rate,
                    config.initial_mortgage.term_years,
                ),
            };
            let mut refi = config.refinance.clone().unwrap_or_else(fallback);
            if let Some(month) = self.refinance_month {
                refi.trigger_month = month;
            }
            if let Some(rate) = self.refinance_rate {
                refi.loan.annual_rate = rate;
            }
            config.refinance = Some(refi);
        }

        config
    }
}

/// Load a configuration from a JSON file; missing fields take their defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PropertyConfig> {
    let file = File::open(path)?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

/// Load scenario override rows from a CSV file
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<ScenarioOverride>> {
    load_scenarios_from_reader(File::open(path)?)
}

/// Load scenario override rows from any reader (e.g., string buffer)
pub fn load_scenarios_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ScenarioOverride>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut scenarios = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ScenarioOverride = result?;
        scenarios.push(row);
    }

    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIOS: &str = "\
Scenario,PurchasePrice,DownPayment,MonthlyRent,MortgageRate,InvestmentYears,RefinanceMonth,RefinanceRate
base,,,,,,,
cheap-rent,,,3500,,,,
refi,,,,0.07,,36,0.05
";

    #[test]
    fn test_load_scenarios_from_reader() {
        let rows = load_scenarios_from_reader(SCENARIOS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "base");
        assert!(rows[0].monthly_rent.is_none());
        assert_eq!(rows[1].monthly_rent, Some(3_500.0));
        assert_eq!(rows[2].refinance_month, Some(36));
    }

    #[test]
    fn test_apply_overrides() {
        let rows = load_scenarios_from_reader(SCENARIOS.as_bytes()).unwrap();
        let base = PropertyConfig::default();

        assert_eq!(rows[0].apply(&base), base);

        let cheap = rows[1].apply(&base);
        assert_eq!(cheap.operating.monthly_rent, 3_500.0);
        assert_eq!(cheap.purchase_price, base.purchase_price);

        let refi = rows[2].apply(&base);
        assert_eq!(refi.initial_mortgage.annual_rate, 0.07);
        let terms = refi.refinance.unwrap();
        assert_eq!(terms.trigger_month, 36);
        assert_eq!(terms.loan.annual_rate, 0.05);
        assert_eq!(terms.loan.term_years, base.initial_mortgage.term_years);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("does/not/exist.json").is_err());
    }
}
