//! Projection configuration: one immutable snapshot per engine run
//!
//! All rates are stored as fractions (0.06 for 6%). Optional tranches are
//! modelled as `Option` rather than boolean switches: `None` means inactive.

pub mod loader;

pub use loader::{load_config, load_scenarios, load_scenarios_from_reader, ScenarioOverride};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// Complete configuration for a single projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyConfig {
    /// Advanced mode applies occupancy and per-line expense growth;
    /// basic mode uses gross rent and the shared CPI assumption
    pub advanced_mode: bool,

    pub purchase_price: f64,
    pub closing_costs: f64,
    pub down_payment_fraction: f64,

    /// Investment horizon; the time grid spans `investment_years * 12` months
    pub investment_years: u32,

    /// Annual home value growth, compounded monthly
    pub home_growth_rate: f64,

    pub initial_mortgage: LoanTerms,

    /// Origination fee on the initial mortgage, as a fraction of its principal
    pub initial_mortgage_fee_rate: f64,

    pub home_equity: Option<HomeEquityLoan>,

    pub refinance: Option<Refinance>,

    pub operating: OperatingAssumptions,

    /// Closing date, used only to label months with calendar dates
    pub closing_date: Option<NaiveDate>,

    /// Starting point for the XIRR solver
    pub irr_guess: f64,
}

/// Rate, term and prepayment plan of one debt tranche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub annual_rate: f64,
    pub term_years: u32,
    #[serde(default)]
    pub extra_payments: Option<ExtraPaymentPlan>,
}

impl LoanTerms {
    pub fn new(annual_rate: f64, term_years: u32) -> Self {
        Self {
            annual_rate,
            term_years,
            extra_payments: None,
        }
    }

    pub fn with_extra_payments(mut self, annual_amount: f64, payments_per_year: u32) -> Self {
        self.extra_payments = Some(ExtraPaymentPlan {
            annual_amount,
            payments_per_year,
        });
        self
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    pub fn term_months(&self) -> u32 {
        self.term_years * 12
    }
}

/// Irregular extra-principal payments on a tranche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentPlan {
    /// Total extra principal paid per year
    pub annual_amount: f64,
    /// Number of installments per year (1..=12)
    pub payments_per_year: u32,
}

impl ExtraPaymentPlan {
    /// Months between installments, `floor(12 / payments_per_year)`.
    /// Frequencies that do not divide 12 keep this approximation.
    pub fn months_between_payments(&self) -> u32 {
        (12 / self.payments_per_year.max(1)).max(1)
    }

    /// Amount of a single installment
    pub fn installment(&self) -> f64 {
        self.annual_amount / self.payments_per_year.max(1) as f64
    }

    /// Whether an installment falls due in `month` (never at closing)
    pub fn is_payment_month(&self, month: u32) -> bool {
        month > 0 && month % self.months_between_payments() == 0
    }
}

/// Home-equity loan drawn at closing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeEquityLoan {
    pub amount: f64,
    #[serde(default)]
    pub fee_rate: f64,
    pub loan: LoanTerms,
}

/// Refinance of the initial mortgage into a new loan mid-horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinance {
    /// Month at which the initial mortgage is paid off. The month itself still
    /// belongs to the initial mortgage; the new loan accrues from the next month.
    pub trigger_month: u32,
    pub loan: LoanTerms,
}

impl Refinance {
    /// Refinance after a (possibly fractional) number of years, rounded to whole months
    pub fn after_years(years: f64, loan: LoanTerms) -> Self {
        Self {
            trigger_month: (years * 12.0).round().max(0.0) as u32,
            loan,
        }
    }
}

/// Annual operating expense amount with its own growth rate (advanced mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub annual_amount: f64,
    #[serde(default)]
    pub annual_growth: f64,
}

impl ExpenseLine {
    pub fn new(annual_amount: f64, annual_growth: f64) -> Self {
        Self {
            annual_amount,
            annual_growth,
        }
    }
}

/// Rental income and operating expense assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingAssumptions {
    pub monthly_rent: f64,
    /// Annual rent escalation, compounded once per 12 months
    pub annual_rent_increase: f64,
    /// Fraction of months let (advanced mode only)
    pub occupancy_rate: f64,
    /// Management fee as a fraction of collected revenue
    pub management_fee: f64,
    /// Shared expense growth in basic mode
    pub cpi_assumption: f64,
    pub insurance: ExpenseLine,
    pub hoa: ExpenseLine,
    pub maintenance: ExpenseLine,
    /// Property tax as a fraction of assessed value
    pub property_tax_rate: f64,
    /// Assessed value growth in advanced mode
    pub property_tax_growth: f64,
}

impl Default for OperatingAssumptions {
    fn default() -> Self {
        Self {
            monthly_rent: 4_500.0,
            annual_rent_increase: 0.02,
            occupancy_rate: 0.95,
            management_fee: 0.10,
            cpi_assumption: 0.03,
            insurance: ExpenseLine::new(2_400.0, 0.03),
            hoa: ExpenseLine::new(0.0, 0.03),
            maintenance: ExpenseLine::new(3_000.0, 0.03),
            property_tax_rate: 0.012,
            property_tax_growth: 0.02,
        }
    }
}

impl Default for PropertyConfig {
    fn default() -> Self {
        Self {
            advanced_mode: false,
            purchase_price: 500_000.0,
            closing_costs: 10_000.0,
            down_payment_fraction: 0.25,
            investment_years: 20,
            home_growth_rate: 0.03,
            initial_mortgage: LoanTerms::new(0.06, 30),
            initial_mortgage_fee_rate: 0.01,
            home_equity: None,
            refinance: None,
            operating: OperatingAssumptions::default(),
            closing_date: None,
            irr_guess: 0.2,
        }
    }
}

impl PropertyConfig {
    /// Last month index of the time grid
    pub fn horizon_months(&self) -> u32 {
        self.investment_years * 12
    }

    pub fn refinance_month(&self) -> Option<u32> {
        self.refinance.as_ref().map(|r| r.trigger_month)
    }

    pub fn home_equity_term_months(&self) -> Option<u32> {
        self.home_equity.as_ref().map(|h| h.loan.term_months())
    }

    /// Check caller preconditions. The engine itself assumes a valid configuration.
    pub fn validate(&self) -> Result<()> {
        if self.investment_years == 0 {
            return Err(ProjectionError::config("investment_years", "must be at least 1"));
        }
        if self.purchase_price.is_nan() || self.purchase_price <= 0.0 {
            return Err(ProjectionError::config("purchase_price", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.down_payment_fraction) {
            return Err(ProjectionError::config(
                "down_payment_fraction",
                "must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.operating.occupancy_rate) {
            return Err(ProjectionError::config("occupancy_rate", "must be between 0 and 1"));
        }

        validate_loan("initial_mortgage", &self.initial_mortgage)?;

        if let Some(hel) = &self.home_equity {
            if hel.amount < 0.0 {
                return Err(ProjectionError::config("home_equity.amount", "must not be negative"));
            }
            validate_loan("home_equity", &hel.loan)?;
        }

        if let Some(refi) = &self.refinance {
            if refi.trigger_month == 0 {
                return Err(ProjectionError::config(
                    "refinance.trigger_month",
                    "refinance cannot happen at closing",
                ));
            }
            validate_loan("refinance", &refi.loan)?;
        }

        Ok(())
    }
}

fn validate_loan(name: &str, loan: &LoanTerms) -> Result<()> {
    if loan.term_years == 0 {
        return Err(ProjectionError::config(
            &format!("{name}.term_years"),
            "must be at least 1",
        ));
    }
    if let Some(plan) = &loan.extra_payments {
        if plan.payments_per_year == 0 || plan.payments_per_year > 12 {
            return Err(ProjectionError::config(
                &format!("{name}.extra_payments.payments_per_year"),
                "must be between 1 and 12",
            ));
        }
        if plan.annual_amount < 0.0 {
            return Err(ProjectionError::config(
                &format!("{name}.extra_payments.annual_amount"),
                "must not be negative",
            ));
        }
    }
    Ok(())
}
