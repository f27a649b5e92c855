//! Rental Projection - monthly projection engine for leveraged rental property
//!
//! This library provides:
//! - Sources & uses sizing with equity as the plug
//! - Amortization of up to three debt tranches (initial mortgage, home-equity
//!   loan, refinanced mortgage) with irregular extra principal payments
//! - Monthly operating and levered cash flows with a terminal home sale
//! - Return metrics (XIRR, MOIC) and a yearly roll-up
//! - Batch scenario runs and a cached configuration snapshot

pub mod config;
pub mod error;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use config::PropertyConfig;
pub use error::{ProjectionError, Result};
pub use projection::{ProjectionEngine, ProjectionResult, ProjectionSummary};
pub use scenario::{CachedProjection, ScenarioRunner};
