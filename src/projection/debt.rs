//! Debt schedule: the three tranches advanced month by month
//!
//! The initial mortgage and home-equity loan are issued at closing. At the
//! refinance month the initial mortgage's post-payment balance is paid off and
//! reissued as the refinanced mortgage in the same month; the refinanced
//! mortgage starts paying and accruing the month after.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PropertyConfig;
use super::sources_uses::SourcesAndUses;
use super::state::{TrancheMonth, TrancheState};
use super::timegrid::{TimeGrid, Tranche};

/// Monthly series for one tranche, aligned to the time grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheSchedule {
    pub tranche: Tranche,
    pub beginning_balance: Vec<f64>,
    pub issuance: Vec<f64>,
    pub scheduled_principal: Vec<f64>,
    pub extra_principal: Vec<f64>,
    pub refinance_payoff: Vec<f64>,
    pub interest_expense: Vec<f64>,
    pub ending_balance: Vec<f64>,
}

impl TrancheSchedule {
    fn with_capacity(tranche: Tranche, len: usize) -> Self {
        Self {
            tranche,
            beginning_balance: Vec::with_capacity(len),
            issuance: Vec::with_capacity(len),
            scheduled_principal: Vec::with_capacity(len),
            extra_principal: Vec::with_capacity(len),
            refinance_payoff: Vec::with_capacity(len),
            interest_expense: Vec::with_capacity(len),
            ending_balance: Vec::with_capacity(len),
        }
    }

    fn push(&mut self, row: &TrancheMonth) {
        self.beginning_balance.push(row.beginning_balance);
        self.issuance.push(row.issuance);
        self.scheduled_principal.push(row.scheduled_principal);
        self.extra_principal.push(row.extra_principal);
        self.refinance_payoff.push(row.refinance_payoff);
        self.interest_expense.push(row.interest_expense);
        self.ending_balance.push(row.ending_balance);
    }

    pub fn len(&self) -> usize {
        self.ending_balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ending_balance.is_empty()
    }

    /// Cash impact of servicing the tranche in `month`: principal and interest
    /// are both outflows, so the result is zero or negative
    pub fn debt_service_at(&self, month: usize) -> f64 {
        -(self.extra_principal[month] + self.scheduled_principal[month]) - self.interest_expense[month]
    }

    pub fn debt_service(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.debt_service_at(i)).collect()
    }

    /// Balance outstanding at the end of the horizon
    pub fn final_balance(&self) -> f64 {
        self.ending_balance.last().copied().unwrap_or(0.0)
    }

    pub fn total_interest(&self) -> f64 {
        self.interest_expense.iter().sum()
    }
}

/// All three tranches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSchedule {
    pub initial_mortgage: TrancheSchedule,
    pub home_equity: TrancheSchedule,
    pub refinanced: TrancheSchedule,
}

impl DebtSchedule {
    /// Advance every tranche across the grid
    pub fn project(config: &PropertyConfig, grid: &TimeGrid, sources: &SourcesAndUses) -> Self {
        let len = grid.len();

        let mut initial = TrancheState::new(
            Tranche::InitialMortgage,
            Some(&config.initial_mortgage),
            sources.initial_mortgage,
        );
        let mut home_equity = TrancheState::new(
            Tranche::HomeEquity,
            config.home_equity.as_ref().map(|h| &h.loan),
            sources.home_equity,
        );
        // Principal basis is set when the refinance happens
        let mut refinanced = TrancheState::new(
            Tranche::Refinanced,
            config.refinance.as_ref().map(|r| &r.loan),
            0.0,
        );

        let mut schedule = Self {
            initial_mortgage: TrancheSchedule::with_capacity(Tranche::InitialMortgage, len),
            home_equity: TrancheSchedule::with_capacity(Tranche::HomeEquity, len),
            refinanced: TrancheSchedule::with_capacity(Tranche::Refinanced, len),
        };

        for month in grid.months() {
            let closing = grid.is_origination_month(month);

            let im_issuance = if closing { sources.initial_mortgage } else { 0.0 };
            let mut im_row = initial.advance(grid, month, im_issuance);

            let mut rm_issuance = 0.0;
            if grid.is_refinance_month(Tranche::InitialMortgage, month) {
                rm_issuance = initial.refinance_away(&mut im_row);
                refinanced.rebase(rm_issuance);
                debug!("Refinance at month {}: payoff {:.2}", month, rm_issuance);
            } else if grid.is_refinanced_by(month) {
                im_row.ending_balance = 0.0;
            }

            let hel_issuance = if closing { sources.home_equity } else { 0.0 };
            let hel_row = home_equity.advance(grid, month, hel_issuance);

            let rm_row = refinanced.advance(grid, month, rm_issuance);

            schedule.initial_mortgage.push(&im_row);
            schedule.home_equity.push(&hel_row);
            schedule.refinanced.push(&rm_row);
        }

        schedule
    }

    pub fn tranche(&self, tranche: Tranche) -> &TrancheSchedule {
        match tranche {
            Tranche::InitialMortgage => &self.initial_mortgage,
            Tranche::HomeEquity => &self.home_equity,
            Tranche::Refinanced => &self.refinanced,
        }
    }

    /// Debt service summed across tranches
    pub fn total_debt_service(&self) -> Vec<f64> {
        (0..self.initial_mortgage.len())
            .map(|i| {
                Tranche::ALL
                    .iter()
                    .map(|&t| self.tranche(t).debt_service_at(i))
                    .sum()
            })
            .collect()
    }

    /// Ending balance summed across tranches
    pub fn total_balance(&self) -> Vec<f64> {
        (0..self.initial_mortgage.len())
            .map(|i| {
                Tranche::ALL
                    .iter()
                    .map(|&t| self.tranche(t).ending_balance[i])
                    .sum()
            })
            .collect()
    }
}
