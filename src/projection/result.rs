//! Projection output record, equity summary and flat monthly rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::PropertyConfig;
use super::annual::{annual_rollup, AnnualRow};
use super::cashflows::{CashFlowRecord, EquityLedger, HomeSale};
use super::debt::DebtSchedule;
use super::irr::ReturnMetrics;
use super::sources_uses::SourcesAndUses;
use super::timegrid::TimeGrid;

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Configuration snapshot the projection was run from
    pub config: PropertyConfig,

    pub grid: TimeGrid,

    pub sources_uses: SourcesAndUses,

    /// Per-tranche monthly balances and flows
    pub debt: DebtSchedule,

    pub cash_flows: CashFlowRecord,

    /// Ending balance summed across tranches
    pub total_debt_balance: Vec<f64>,

    pub home_sale: HomeSale,

    pub equity: EquityLedger,

    pub returns: ReturnMetrics,
}

impl ProjectionResult {
    pub fn irr(&self) -> f64 {
        self.returns.irr
    }

    pub fn moic(&self) -> f64 {
        self.returns.moic
    }

    pub fn roe(&self) -> f64 {
        self.returns.roe
    }

    /// Number of grid months, closing month included
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let additional_equity = self.cash_flows.total_additional_equity();
        let total_levered_fcf = self.cash_flows.total_levered_fcf();
        let rental_proceeds_after_debt = total_levered_fcf + additional_equity;

        ProjectionSummary {
            total_months: self.grid.horizon(),
            equity_at_closing: self.sources_uses.equity,
            additional_equity,
            total_equity_invested: self.equity.total_invested,
            home_value_at_sale: self.home_sale.property_value,
            initial_mortgage_balance: self.home_sale.initial_mortgage_balance,
            home_equity_balance: self.home_sale.home_equity_balance,
            refinanced_balance: self.home_sale.refinanced_balance,
            total_debt_at_sale: self.home_sale.total_debt(),
            home_sale_proceeds: self.home_sale.net_proceeds,
            rental_proceeds_after_debt,
            total_profit: self.home_sale.net_proceeds + rental_proceeds_after_debt,
            irr: self.returns.irr,
            moic: self.returns.moic,
        }
    }

    /// One flat row per grid month
    pub fn rows(&self) -> Vec<MonthlyRow> {
        let cf = &self.cash_flows;
        let im = &self.debt.initial_mortgage;
        let hel = &self.debt.home_equity;
        let rm = &self.debt.refinanced;

        self.grid
            .months()
            .map(|month| {
                let i = month as usize;
                MonthlyRow {
                    month,
                    date: self
                        .config
                        .closing_date
                        .and_then(|closing| self.grid.calendar_month(closing, month)),
                    revenue: cf.revenue[i],
                    insurance: cf.insurance[i],
                    hoa: cf.hoa[i],
                    property_tax: cf.property_tax[i],
                    maintenance: cf.maintenance[i],
                    management_fee: cf.management_fee[i],
                    operating_cash_flow: cf.operating_cash_flow[i],
                    im_beginning_balance: im.beginning_balance[i],
                    im_principal: im.scheduled_principal[i],
                    im_extra_principal: im.extra_principal[i],
                    im_interest: im.interest_expense[i],
                    im_refinance_payoff: im.refinance_payoff[i],
                    im_ending_balance: im.ending_balance[i],
                    hel_beginning_balance: hel.beginning_balance[i],
                    hel_principal: hel.scheduled_principal[i],
                    hel_extra_principal: hel.extra_principal[i],
                    hel_interest: hel.interest_expense[i],
                    hel_ending_balance: hel.ending_balance[i],
                    rm_beginning_balance: rm.beginning_balance[i],
                    rm_issuance: rm.issuance[i],
                    rm_principal: rm.scheduled_principal[i],
                    rm_extra_principal: rm.extra_principal[i],
                    rm_interest: rm.interest_expense[i],
                    rm_ending_balance: rm.ending_balance[i],
                    total_debt_service: cf.total_debt_service[i],
                    levered_fcf: cf.levered_fcf[i],
                    additional_equity: cf.additional_equity[i],
                    property_value: cf.property_value[i],
                    net_equity: self.equity.net_equity[i],
                }
            })
            .collect()
    }

    pub fn annual(&self) -> Vec<AnnualRow> {
        annual_rollup(self)
    }
}

/// Equity summary of a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_months: u32,
    pub equity_at_closing: f64,
    pub additional_equity: f64,
    pub total_equity_invested: f64,
    pub home_value_at_sale: f64,
    pub initial_mortgage_balance: f64,
    pub home_equity_balance: f64,
    pub refinanced_balance: f64,
    pub total_debt_at_sale: f64,
    pub home_sale_proceeds: f64,
    /// Levered FCF with the additional equity draws added back
    pub rental_proceeds_after_debt: f64,
    pub total_profit: f64,
    pub irr: f64,
    pub moic: f64,
}

/// Flat monthly record for CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub month: u32,
    pub date: Option<NaiveDate>,
    pub revenue: f64,
    pub insurance: f64,
    pub hoa: f64,
    pub property_tax: f64,
    pub maintenance: f64,
    pub management_fee: f64,
    pub operating_cash_flow: f64,

    pub im_beginning_balance: f64,
    pub im_principal: f64,
    pub im_extra_principal: f64,
    pub im_interest: f64,
    pub im_refinance_payoff: f64,
    pub im_ending_balance: f64,

    pub hel_beginning_balance: f64,
    pub hel_principal: f64,
    pub hel_extra_principal: f64,
    pub hel_interest: f64,
    pub hel_ending_balance: f64,

    pub rm_beginning_balance: f64,
    pub rm_issuance: f64,
    pub rm_principal: f64,
    pub rm_extra_principal: f64,
    pub rm_interest: f64,
    pub rm_ending_balance: f64,

    pub total_debt_service: f64,
    pub levered_fcf: f64,
    pub additional_equity: f64,
    pub property_value: f64,
    pub net_equity: f64,
}
