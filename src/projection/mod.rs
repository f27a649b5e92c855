//! Projection engine: time grid, sizing, tranche amortization, cash flows and returns

pub mod amortization;
mod annual;
mod cashflows;
mod debt;
mod engine;
pub mod irr;
mod result;
mod sources_uses;
mod state;
mod timegrid;

pub use annual::{annual_rollup, AnnualRow};
pub use cashflows::{CashFlowRecord, EquityLedger, HomeSale};
pub use debt::{DebtSchedule, TrancheSchedule};
pub use engine::ProjectionEngine;
pub use irr::{moic, npv, xirr, ReturnMetrics, DEFAULT_IRR_GUESS};
pub use result::{MonthlyRow, ProjectionResult, ProjectionSummary};
pub use sources_uses::SourcesAndUses;
pub use state::{TrancheMonth, TrancheState};
pub use timegrid::{TimeGrid, Tranche};
