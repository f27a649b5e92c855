//! Core projection engine for a leveraged rental holding

use log::debug;

use crate::config::PropertyConfig;
use crate::error::Result;
use super::cashflows::{CashFlowRecord, EquityLedger, HomeSale};
use super::debt::DebtSchedule;
use super::irr::ReturnMetrics;
use super::result::ProjectionResult;
use super::sources_uses::SourcesAndUses;
use super::timegrid::TimeGrid;

/// Main projection engine
///
/// Holds a configuration snapshot. Every run recomputes from scratch, so two
/// runs of the same snapshot are bit-identical.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    config: PropertyConfig,
}

impl ProjectionEngine {
    pub fn new(config: PropertyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PropertyConfig {
        &self.config
    }

    /// Run the full projection: grid, sizing, debt, cash flows, sale and returns.
    ///
    /// Inputs are not validated here; call `PropertyConfig::validate` first
    /// when they come from an untrusted source. Fails only when the XIRR solver
    /// cannot produce a rate.
    pub fn run(&self) -> Result<ProjectionResult> {
        let config = &self.config;
        debug!(
            "Projecting {} years, price {:.2}, refinance {:?}, home equity {}",
            config.investment_years,
            config.purchase_price,
            config.refinance_month(),
            config.home_equity.is_some()
        );

        let grid = TimeGrid::from_config(config);
        let sources_uses = SourcesAndUses::from_config(config);
        let debt = DebtSchedule::project(config, &grid, &sources_uses);
        let cash_flows = CashFlowRecord::project(config, &grid, &debt);
        let total_debt_balance = debt.total_balance();

        let home_sale = HomeSale::at_horizon(&cash_flows, &debt);
        debug!(
            "Sale at month {}: value {:.2}, debt {:.2}, proceeds {:.2}",
            grid.horizon(),
            home_sale.property_value,
            home_sale.total_debt(),
            home_sale.net_proceeds
        );

        let equity = EquityLedger::build(sources_uses.equity, &cash_flows, &home_sale);

        let months: Vec<u32> = grid.months().collect();
        let returns = ReturnMetrics::solve(
            &cash_flows.levered_fcf,
            &cash_flows.additional_equity,
            &months,
            sources_uses.equity,
            home_sale.net_proceeds,
            config.irr_guess,
        )?;
        debug!("IRR {:.6}, MOIC {:.4}", returns.irr, returns.moic);

        Ok(ProjectionResult {
            config: config.clone(),
            grid,
            sources_uses,
            debt,
            cash_flows,
            total_debt_balance,
            home_sale,
            equity,
            returns,
        })
    }
}
