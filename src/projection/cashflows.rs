//! Cash flow projector: operating income and expenses, debt service, levered
//! free cash flow and the terminal sale
//!
//! Every series has one slot per grid month. Month 0 is the closing instant and
//! carries no operating flows. Expenses are stored as negative amounts.

use serde::{Deserialize, Serialize};

use crate::config::{ExpenseLine, PropertyConfig};
use super::debt::DebtSchedule;
use super::timegrid::{TimeGrid, Tranche};

/// Monthly operating and levered cash flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRecord {
    // Revenue
    pub revenue: Vec<f64>,
    /// Rent before the occupancy adjustment
    pub raw_revenue: Vec<f64>,

    // Operating expenses (negative)
    pub insurance: Vec<f64>,
    pub hoa: Vec<f64>,
    pub property_tax: Vec<f64>,
    pub maintenance: Vec<f64>,
    pub management_fee: Vec<f64>,

    pub operating_cash_flow: Vec<f64>,

    // Debt service per tranche (negative = cash out)
    pub initial_mortgage_debt_service: Vec<f64>,
    pub home_equity_debt_service: Vec<f64>,
    pub refinanced_debt_service: Vec<f64>,
    pub total_debt_service: Vec<f64>,

    pub levered_fcf: Vec<f64>,

    /// Cash the investor must inject when levered FCF is negative
    pub additional_equity: Vec<f64>,

    // Valuation
    pub property_value: Vec<f64>,
    /// Property tax base
    pub assessed_value: Vec<f64>,
}

/// Terminal sale at the last grid month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSale {
    pub property_value: f64,
    pub initial_mortgage_balance: f64,
    pub home_equity_balance: f64,
    pub refinanced_balance: f64,
    pub net_proceeds: f64,
}

impl HomeSale {
    pub fn at_horizon(cash_flows: &CashFlowRecord, debt: &DebtSchedule) -> Self {
        let property_value = cash_flows.property_value.last().copied().unwrap_or(0.0);
        let initial_mortgage_balance = debt.initial_mortgage.final_balance();
        let home_equity_balance = debt.home_equity.final_balance();
        let refinanced_balance = debt.refinanced.final_balance();

        Self {
            property_value,
            initial_mortgage_balance,
            home_equity_balance,
            refinanced_balance,
            net_proceeds: property_value
                - initial_mortgage_balance
                - home_equity_balance
                - refinanced_balance,
        }
    }

    /// Balance of `tranche` repaid out of the sale
    pub fn balance(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::InitialMortgage => self.initial_mortgage_balance,
            Tranche::HomeEquity => self.home_equity_balance,
            Tranche::Refinanced => self.refinanced_balance,
        }
    }

    pub fn total_debt(&self) -> f64 {
        Tranche::ALL.iter().map(|&tranche| self.balance(tranche)).sum()
    }
}

/// Monthly compounding of an annual rate, `(1 + annual/12)^periods`
fn monthly_growth(annual_rate: f64, periods: u32) -> f64 {
    (1.0 + annual_rate / 12.0).powi(periods as i32)
}

/// Expense line booked in `month`, already signed negative
fn booked_expense(grid: &TimeGrid, month: u32, annual_amount: f64, factor: f64) -> f64 {
    if grid.is_annual_booking_month(month) {
        -annual_amount * factor
    } else {
        0.0
    }
}

impl CashFlowRecord {
    /// Project operating flows from the configuration and combine them with the
    /// debt schedule
    pub fn project(config: &PropertyConfig, grid: &TimeGrid, debt: &DebtSchedule) -> Self {
        let ops = &config.operating;
        let len = grid.len();

        let mut record = Self {
            revenue: Vec::with_capacity(len),
            raw_revenue: Vec::with_capacity(len),
            insurance: Vec::with_capacity(len),
            hoa: Vec::with_capacity(len),
            property_tax: Vec::with_capacity(len),
            maintenance: Vec::with_capacity(len),
            management_fee: Vec::with_capacity(len),
            operating_cash_flow: Vec::with_capacity(len),
            initial_mortgage_debt_service: debt.tranche(Tranche::InitialMortgage).debt_service(),
            home_equity_debt_service: debt.tranche(Tranche::HomeEquity).debt_service(),
            refinanced_debt_service: debt.tranche(Tranche::Refinanced).debt_service(),
            total_debt_service: debt.total_debt_service(),
            levered_fcf: Vec::with_capacity(len),
            additional_equity: Vec::with_capacity(len),
            property_value: Vec::with_capacity(len),
            assessed_value: Vec::with_capacity(len),
        };

        for month in grid.months() {
            let i = month as usize;
            let elapsed = month.saturating_sub(1);

            let property_value = config.purchase_price * monthly_growth(config.home_growth_rate, elapsed);
            let assessed_value = if config.advanced_mode {
                config.purchase_price * monthly_growth(ops.property_tax_growth, elapsed)
            } else {
                property_value
            };

            let raw_revenue = if grid.is_origination_month(month) {
                0.0
            } else {
                ops.monthly_rent * (1.0 + ops.annual_rent_increase).powi(grid.rent_year(month) as i32)
            };
            let revenue = if config.advanced_mode {
                ops.occupancy_rate * raw_revenue
            } else {
                raw_revenue
            };

            // Advanced mode escalates each line at its own rate from closing;
            // basic mode escalates all lines with CPI from the first month
            let escalate = |line: &ExpenseLine| -> f64 {
                if config.advanced_mode {
                    monthly_growth(line.annual_growth, month)
                } else {
                    monthly_growth(ops.cpi_assumption, elapsed)
                }
            };

            let insurance = booked_expense(grid, month, ops.insurance.annual_amount, escalate(&ops.insurance));
            let hoa = booked_expense(grid, month, ops.hoa.annual_amount, escalate(&ops.hoa));
            let maintenance =
                booked_expense(grid, month, ops.maintenance.annual_amount, escalate(&ops.maintenance));
            let property_tax = booked_expense(grid, month, assessed_value, ops.property_tax_rate);
            let management_fee = -revenue * ops.management_fee;

            let operating = revenue + insurance + hoa + property_tax + maintenance + management_fee;
            let levered = operating + record.total_debt_service[i];

            record.revenue.push(revenue);
            record.raw_revenue.push(raw_revenue);
            record.insurance.push(insurance);
            record.hoa.push(hoa);
            record.property_tax.push(property_tax);
            record.maintenance.push(maintenance);
            record.management_fee.push(management_fee);
            record.operating_cash_flow.push(operating);
            record.levered_fcf.push(levered);
            record.additional_equity.push((-levered).max(0.0));
            record.property_value.push(property_value);
            record.assessed_value.push(assessed_value);
        }

        record
    }

    pub fn len(&self) -> usize {
        self.levered_fcf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levered_fcf.is_empty()
    }

    /// Sum of all expense lines in `month` (negative)
    pub fn total_expenses_at(&self, month: usize) -> f64 {
        self.insurance[month]
            + self.hoa[month]
            + self.property_tax[month]
            + self.maintenance[month]
            + self.management_fee[month]
    }

    pub fn total_additional_equity(&self) -> f64 {
        self.additional_equity.iter().sum()
    }

    pub fn total_levered_fcf(&self) -> f64 {
        self.levered_fcf.iter().sum()
    }

    /// Sum of the positive months of levered FCF
    pub fn total_positive_fcf(&self) -> f64 {
        self.levered_fcf.iter().map(|&v| v.max(0.0)).sum()
    }
}

/// Equity contributed and distributed over the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityLedger {
    /// Initial equity at month 0, then each month's additional equity draw
    pub contributions: Vec<f64>,
    /// Positive levered FCF, with net sale proceeds added in the last month
    pub distributions: Vec<f64>,
    pub cumulative_contributions: Vec<f64>,
    pub cumulative_distributions: Vec<f64>,
    /// Cumulative distributions less cumulative contributions
    pub net_equity: Vec<f64>,
    pub total_invested: f64,
    pub total_returned: f64,
}

impl EquityLedger {
    pub fn build(initial_equity: f64, cash_flows: &CashFlowRecord, sale: &HomeSale) -> Self {
        let len = cash_flows.len();

        let contributions: Vec<f64> = (0..len)
            .map(|i| {
                if i == 0 {
                    initial_equity
                } else {
                    cash_flows.additional_equity[i]
                }
            })
            .collect();

        let mut distributions: Vec<f64> = cash_flows.levered_fcf.iter().map(|&v| v.max(0.0)).collect();
        if let Some(last) = distributions.last_mut() {
            *last += sale.net_proceeds;
        }

        let mut cumulative_contributions = Vec::with_capacity(len);
        let mut cumulative_distributions = Vec::with_capacity(len);
        let mut net_equity = Vec::with_capacity(len);
        let (mut contributed, mut distributed) = (0.0, 0.0);
        for i in 0..len {
            contributed += contributions[i];
            distributed += distributions[i];
            cumulative_contributions.push(contributed);
            cumulative_distributions.push(distributed);
            net_equity.push(distributed - contributed);
        }

        Self {
            total_invested: initial_equity + cash_flows.total_additional_equity(),
            total_returned: cash_flows.total_positive_fcf() + sale.net_proceeds,
            contributions,
            distributions,
            cumulative_contributions,
            cumulative_distributions,
            net_equity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanTerms;
    use crate::projection::sources_uses::SourcesAndUses;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn project(config: &PropertyConfig) -> (TimeGrid, DebtSchedule, CashFlowRecord) {
        let grid = TimeGrid::from_config(config);
        let sources = SourcesAndUses::from_config(config);
        let debt = DebtSchedule::project(config, &grid, &sources);
        let record = CashFlowRecord::project(config, &grid, &debt);
        (grid, debt, record)
    }

    #[test]
    fn test_series_aligned_to_grid() {
        let (grid, _, record) = project(&PropertyConfig::default());
        for series in [
            &record.revenue,
            &record.insurance,
            &record.operating_cash_flow,
            &record.total_debt_service,
            &record.levered_fcf,
            &record.additional_equity,
            &record.property_value,
        ] {
            assert_eq!(series.len(), grid.len());
        }
        assert_eq!(record.revenue[0], 0.0);
        assert_eq!(record.operating_cash_flow[0], 0.0);
        assert_eq!(record.levered_fcf[0], 0.0);
    }

    #[test]
    fn test_rent_escalates_annually() {
        let (_, _, record) = project(&PropertyConfig::default());
        assert_relative_eq!(record.revenue[1], 4_500.0);
        assert_relative_eq!(record.revenue[12], 4_500.0);
        assert_relative_eq!(record.revenue[13], 4_500.0 * 1.02);
        assert_relative_eq!(record.revenue[25], 4_500.0 * 1.02 * 1.02, max_relative = 1e-12);
    }

    #[test]
    fn test_advanced_mode_applies_occupancy() {
        let config = PropertyConfig { advanced_mode: true, ..Default::default() };
        let (_, _, record) = project(&config);
        assert_relative_eq!(record.raw_revenue[1], 4_500.0);
        assert_relative_eq!(record.revenue[1], 4_500.0 * 0.95);
        assert_relative_eq!(record.management_fee[1], -4_500.0 * 0.95 * 0.10);
    }

    #[test]
    fn test_expenses_booked_every_twelve_months() {
        for advanced_mode in [false, true] {
            let config = PropertyConfig { advanced_mode, ..Default::default() };
            let (_, _, record) = project(&config);
            for i in 0..record.len() {
                let booked = i > 0 && i % 12 == 0;
                for series in [&record.insurance, &record.maintenance, &record.property_tax] {
                    if booked {
                        assert!(series[i] < 0.0, "expected booking at month {}", i);
                    } else {
                        assert_eq!(series[i], 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_expense_escalation() {
        let basic = PropertyConfig::default();
        let (_, _, record) = project(&basic);
        let cpi = (1.0 + 0.03 / 12.0_f64).powi(11);
        assert_relative_eq!(record.insurance[12], -2_400.0 * cpi, max_relative = 1e-12);
        let value = 500_000.0 * (1.0 + 0.03 / 12.0_f64).powi(11);
        assert_relative_eq!(record.property_tax[12], -value * 0.012, max_relative = 1e-12);

        let advanced = PropertyConfig { advanced_mode: true, ..Default::default() };
        let (_, _, record) = project(&advanced);
        let growth = (1.0 + 0.03 / 12.0_f64).powi(12);
        assert_relative_eq!(record.insurance[12], -2_400.0 * growth, max_relative = 1e-12);
        let assessed = 500_000.0 * (1.0 + 0.02 / 12.0_f64).powi(11);
        assert_relative_eq!(record.property_tax[12], -assessed * 0.012, max_relative = 1e-12);
    }

    #[test]
    fn test_levered_fcf_and_additional_equity() {
        let (_, debt, record) = project(&PropertyConfig::default());
        for i in 0..record.len() {
            let operating = record.revenue[i] + record.total_expenses_at(i);
            assert_abs_diff_eq!(record.operating_cash_flow[i], operating, epsilon = 1e-9);

            let service = debt.initial_mortgage.debt_service_at(i)
                + debt.home_equity.debt_service_at(i)
                + debt.refinanced.debt_service_at(i);
            assert_abs_diff_eq!(record.total_debt_service[i], service, epsilon = 1e-9);
            assert_abs_diff_eq!(
                record.levered_fcf[i],
                record.operating_cash_flow[i] + record.total_debt_service[i],
                epsilon = 1e-9
            );
            assert!(record.additional_equity[i] >= 0.0);
            assert_relative_eq!(record.additional_equity[i], (-record.levered_fcf[i]).max(0.0));
        }
        // Annual expense months dip below zero on this deal
        assert!(record.total_additional_equity() > 0.0);
    }

    #[test]
    fn test_home_sale() {
        let config = PropertyConfig {
            investment_years: 10,
            initial_mortgage: LoanTerms::new(0.06, 30),
            ..Default::default()
        };
        let (_, debt, record) = project(&config);
        let sale = HomeSale::at_horizon(&record, &debt);

        let expected_value = 500_000.0 * (1.0 + 0.03 / 12.0_f64).powi(119);
        assert_relative_eq!(sale.property_value, expected_value, max_relative = 1e-12);
        assert_relative_eq!(sale.initial_mortgage_balance, debt.initial_mortgage.ending_balance[120]);
        assert_eq!(sale.home_equity_balance, 0.0);
        assert_relative_eq!(sale.net_proceeds, sale.property_value - sale.total_debt());
        for tranche in Tranche::ALL {
            assert_eq!(sale.balance(tranche), debt.tranche(tranche).final_balance());
        }
    }

    #[test]
    fn test_equity_ledger_totals() {
        let (_, debt, record) = project(&PropertyConfig::default());
        let sale = HomeSale::at_horizon(&record, &debt);
        let ledger = EquityLedger::build(138_750.0, &record, &sale);

        let last = ledger.net_equity.len() - 1;
        assert_relative_eq!(ledger.cumulative_contributions[last], ledger.total_invested, max_relative = 1e-9);
        assert_relative_eq!(ledger.cumulative_distributions[last], ledger.total_returned, max_relative = 1e-9);
        assert_relative_eq!(
            ledger.net_equity[last],
            ledger.total_returned - ledger.total_invested,
            max_relative = 1e-9
        );
        assert_eq!(ledger.contributions[0], 138_750.0);
    }
}
