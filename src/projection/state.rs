//! Running state of a single debt tranche during projection

use crate::config::{ExtraPaymentPlan, LoanTerms};
use super::amortization;
use super::timegrid::{TimeGrid, Tranche};

/// One month of activity on a tranche. Principal amounts are positive magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrancheMonth {
    pub beginning_balance: f64,
    pub issuance: f64,
    pub extra_principal: f64,
    pub scheduled_principal: f64,
    /// Balance paid off by refinance (initial mortgage only)
    pub refinance_payoff: f64,
    pub interest_expense: f64,
    pub ending_balance: f64,
}

impl TrancheMonth {
    /// Balance left after this month's own payments, before any refinance
    pub fn balance_after_payments(&self) -> f64 {
        self.beginning_balance + self.issuance - self.extra_principal - self.scheduled_principal
    }
}

/// State of a tranche between months
#[derive(Debug, Clone)]
pub struct TrancheState {
    pub tranche: Tranche,

    /// Monthly interest rate
    pub monthly_rate: f64,

    /// Amortization term in months
    pub term_months: u32,

    /// Principal the bank schedule amortizes: the original loan amount, or the
    /// refinance payoff for the refinanced mortgage
    pub principal_basis: f64,

    pub extra_payments: Option<ExtraPaymentPlan>,

    /// Ending balance of the last processed month
    pub eop_balance: f64,
}

impl TrancheState {
    /// Initialize a tranche; `terms` of `None` yields an inert tranche
    pub fn new(tranche: Tranche, terms: Option<&LoanTerms>, principal_basis: f64) -> Self {
        match terms {
            Some(terms) => Self {
                tranche,
                monthly_rate: terms.monthly_rate(),
                term_months: terms.term_months(),
                principal_basis,
                extra_payments: terms.extra_payments.clone(),
                eop_balance: 0.0,
            },
            None => Self {
                tranche,
                monthly_rate: 0.0,
                term_months: 0,
                principal_basis: 0.0,
                extra_payments: None,
                eop_balance: 0.0,
            },
        }
    }

    /// Beginning balance for `month`: zero at inception and, for the initial
    /// mortgage, after it has been refinanced away
    pub fn bop_balance(&self, grid: &TimeGrid, month: u32) -> f64 {
        if grid.is_origination_month(month) {
            0.0
        } else if self.tranche == Tranche::InitialMortgage && grid.is_after_refinance(month) {
            0.0
        } else {
            self.eop_balance
        }
    }

    /// Advance the tranche through `month`, given the month's issuance.
    ///
    /// Extra principal is evaluated first and clipped to the available balance.
    /// Scheduled principal follows the bank schedule on `principal_basis` and is
    /// clipped to what the extra payment left. Interest accrues on the
    /// pre-payment beginning balance. Refinance is applied by the caller.
    pub fn advance(&mut self, grid: &TimeGrid, month: u32, issuance: f64) -> TrancheMonth {
        let beginning_balance = self.bop_balance(grid, month);
        let available = (beginning_balance + issuance).max(0.0);

        let mut row = TrancheMonth {
            beginning_balance,
            issuance,
            ..Default::default()
        };

        if let Some(period) = grid.payment_index(self.tranche, month) {
            if let Some(plan) = &self.extra_payments {
                if plan.is_payment_month(month) {
                    row.extra_principal = plan.installment().min(available);
                }
            }

            let formula = amortization::scheduled_principal(
                self.monthly_rate,
                period,
                self.term_months,
                self.principal_basis,
            );
            row.scheduled_principal = formula.min(available - row.extra_principal).max(0.0);

            row.interest_expense = beginning_balance * self.monthly_rate;
        }

        row.ending_balance = row.balance_after_payments();
        self.eop_balance = row.ending_balance;
        row
    }

    /// Pay the tranche off in full after this month's payments
    pub fn refinance_away(&mut self, row: &mut TrancheMonth) -> f64 {
        let payoff = row.balance_after_payments();
        row.refinance_payoff = payoff;
        row.ending_balance = 0.0;
        self.eop_balance = 0.0;
        payoff
    }

    /// Re-base the bank schedule on a new principal (refinance issuance)
    pub fn rebase(&mut self, principal: f64) {
        self.principal_basis = principal;
    }
}
