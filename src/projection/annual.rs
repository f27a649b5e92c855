//! Yearly roll-up of the monthly projection

use serde::{Deserialize, Serialize};

use super::result::ProjectionResult;
use super::timegrid::Tranche;

/// One investment year. Expenses, interest and principal are magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: u32,
    pub revenue: f64,
    pub insurance: f64,
    pub hoa: f64,
    pub property_tax: f64,
    pub maintenance: f64,
    pub management_fee: f64,
    pub operating_cash_flow: f64,
    pub interest: f64,
    /// Scheduled plus extra principal across all tranches
    pub principal: f64,
    pub levered_fcf: f64,
    pub additional_equity: f64,
    /// Total debt outstanding at the last month of the year
    pub ending_debt_balance: f64,
}

/// Sum months `12(y-1)+1 ..= 12y` into year `y`, for `y` in `1..=years`
pub fn annual_rollup(result: &ProjectionResult) -> Vec<AnnualRow> {
    let cf = &result.cash_flows;
    let debt = &result.debt;
    let years = result.grid.horizon() / 12;

    (1..=years)
        .map(|year| {
            let months = (12 * (year - 1) + 1) as usize..=(12 * year) as usize;
            let sum = |series: &[f64]| -> f64 { series[months.clone()].iter().sum() };

            let mut interest = 0.0;
            let mut principal = 0.0;
            for tranche in Tranche::ALL {
                let schedule = debt.tranche(tranche);
                interest += sum(&schedule.interest_expense);
                principal += sum(&schedule.scheduled_principal) + sum(&schedule.extra_principal);
            }

            AnnualRow {
                year,
                revenue: sum(&cf.revenue),
                insurance: -sum(&cf.insurance),
                hoa: -sum(&cf.hoa),
                property_tax: -sum(&cf.property_tax),
                maintenance: -sum(&cf.maintenance),
                management_fee: -sum(&cf.management_fee),
                operating_cash_flow: sum(&cf.operating_cash_flow),
                interest,
                principal,
                levered_fcf: sum(&cf.levered_fcf),
                additional_equity: sum(&cf.additional_equity),
                ending_debt_balance: result.total_debt_balance[12 * year as usize],
            }
        })
        .collect()
}
