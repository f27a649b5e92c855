//! Month grid and per-tranche active windows
//!
//! Month 0 is the closing instant: no accrual and no payments. Months
//! `1..=N` carry operations. Each tranche owns a window of months in which it
//! may accrue interest and receive payments, stored as the tranche's own
//! payment index (1-based) or 0 when inactive.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::PropertyConfig;

/// The three debt instruments a projection can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tranche {
    InitialMortgage,
    HomeEquity,
    Refinanced,
}

impl Tranche {
    pub const ALL: [Tranche; 3] = [Tranche::InitialMortgage, Tranche::HomeEquity, Tranche::Refinanced];

    pub fn index(self) -> usize {
        match self {
            Tranche::InitialMortgage => 0,
            Tranche::HomeEquity => 1,
            Tranche::Refinanced => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tranche::InitialMortgage => "Initial Mortgage",
            Tranche::HomeEquity => "Home Equity Loan",
            Tranche::Refinanced => "Refinanced Mortgage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    /// Last month index (`years * 12`)
    horizon: u32,
    refinance_month: Option<u32>,
    /// Payment index per month, one array per tranche, indexed by `Tranche::index`
    windows: [Vec<u32>; 3],
}

impl TimeGrid {
    /// Build the grid for `years` of monthly operation.
    ///
    /// `refinance_month` splits the mortgage lifetime: the initial mortgage is
    /// active through that month inclusive and the refinanced mortgage from the
    /// following month. `hel_term_months` bounds the home-equity window.
    pub fn new(years: u32, refinance_month: Option<u32>, hel_term_months: Option<u32>) -> Self {
        let horizon = years * 12;
        let len = horizon as usize + 1;

        let initial_end = refinance_month.map_or(horizon, |r| r.min(horizon));
        let initial: Vec<u32> = (0..=horizon)
            .map(|i| if i >= 1 && i <= initial_end { i } else { 0 })
            .collect();

        let refinanced: Vec<u32> = match refinance_month {
            Some(r) => (0..=horizon).map(|i| if i > r { i - r } else { 0 }).collect(),
            None => vec![0; len],
        };

        let home_equity: Vec<u32> = match hel_term_months {
            Some(term) => (0..=horizon)
                .map(|i| if i >= 1 && i <= term.min(horizon) { i } else { 0 })
                .collect(),
            None => vec![0; len],
        };

        Self {
            horizon,
            refinance_month,
            windows: [initial, home_equity, refinanced],
        }
    }

    pub fn from_config(config: &PropertyConfig) -> Self {
        Self::new(
            config.investment_years,
            config.refinance_month(),
            config.home_equity_term_months(),
        )
    }

    /// Number of month slots, `N + 1`
    pub fn len(&self) -> usize {
        self.horizon as usize + 1
    }

    /// Always false: the closing month is always present
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Last month index, `N`
    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    /// Month indices `0..=N`
    pub fn months(&self) -> impl Iterator<Item = u32> {
        0..=self.horizon
    }

    pub fn refinance_month(&self) -> Option<u32> {
        self.refinance_month
    }

    pub fn is_origination_month(&self, month: u32) -> bool {
        month == 0
    }

    pub fn is_terminal_month(&self, month: u32) -> bool {
        month == self.horizon
    }

    /// The month at which `tranche` is refinanced away. Only the initial
    /// mortgage is ever refinanced.
    pub fn is_refinance_month(&self, tranche: Tranche, month: u32) -> bool {
        tranche == Tranche::InitialMortgage && self.refinance_month == Some(month)
    }

    /// Whether `month` lies at or after the refinance of the initial mortgage
    pub fn is_refinanced_by(&self, month: u32) -> bool {
        self.refinance_month.is_some_and(|r| month >= r)
    }

    /// Whether `month` lies strictly after the refinance of the initial mortgage
    pub fn is_after_refinance(&self, month: u32) -> bool {
        self.refinance_month.is_some_and(|r| month > r)
    }

    /// The tranche's own 1-based payment index in `month`, if active
    pub fn payment_index(&self, tranche: Tranche, month: u32) -> Option<u32> {
        match self.windows[tranche.index()].get(month as usize) {
            Some(&k) if k > 0 => Some(k),
            _ => None,
        }
    }

    pub fn is_active(&self, tranche: Tranche, month: u32) -> bool {
        self.payment_index(tranche, month).is_some()
    }

    /// Raw window array for `tranche` (0 = inactive)
    pub fn window(&self, tranche: Tranche) -> &[u32] {
        &self.windows[tranche.index()]
    }

    /// Operating expenses are booked once per 12-month cycle
    pub fn is_annual_booking_month(&self, month: u32) -> bool {
        month > 0 && month % 12 == 0
    }

    /// Completed rent years before `month`: `floor((month - 1) / 12)`
    pub fn rent_year(&self, month: u32) -> u32 {
        month.saturating_sub(1) / 12
    }

    /// Investment year (1-based) a month belongs to; 0 for closing
    pub fn investment_year(&self, month: u32) -> u32 {
        if month == 0 {
            0
        } else {
            (month - 1) / 12 + 1
        }
    }

    /// Calendar month of `month` counted from the closing date
    pub fn calendar_month(&self, closing: NaiveDate, month: u32) -> Option<NaiveDate> {
        closing.checked_add_months(Months::new(month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tranche_order_and_labels() {
        for (i, tranche) in Tranche::ALL.iter().enumerate() {
            assert_eq!(tranche.index(), i);
        }
        assert_eq!(Tranche::HomeEquity.label(), "Home Equity Loan");
        assert_eq!(Tranche::Refinanced.label(), "Refinanced Mortgage");
    }

    #[test]
    fn test_grid_length() {
        let grid = TimeGrid::new(20, None, None);
        assert_eq!(grid.len(), 241);
        assert_eq!(grid.horizon(), 240);
        assert_eq!(grid.months().count(), 241);
    }

    #[test]
    fn test_no_refinance_windows() {
        let grid = TimeGrid::new(5, None, None);
        assert!(!grid.is_active(Tranche::InitialMortgage, 0));
        assert_eq!(grid.payment_index(Tranche::InitialMortgage, 1), Some(1));
        assert_eq!(grid.payment_index(Tranche::InitialMortgage, 60), Some(60));
        assert!(grid.window(Tranche::Refinanced).iter().all(|&k| k == 0));
        assert!(grid.window(Tranche::HomeEquity).iter().all(|&k| k == 0));
    }

    #[test]
    fn test_refinance_boundary_belongs_to_initial_mortgage() {
        let grid = TimeGrid::new(10, Some(36), None);

        assert_eq!(grid.payment_index(Tranche::InitialMortgage, 36), Some(36));
        assert!(!grid.is_active(Tranche::InitialMortgage, 37));
        assert!(!grid.is_active(Tranche::Refinanced, 36));
        assert_eq!(grid.payment_index(Tranche::Refinanced, 37), Some(1));
        assert_eq!(grid.payment_index(Tranche::Refinanced, 120), Some(84));

        assert!(grid.is_refinance_month(Tranche::InitialMortgage, 36));
        assert!(!grid.is_refinance_month(Tranche::Refinanced, 36));
        assert!(grid.is_refinanced_by(36));
        assert!(!grid.is_after_refinance(36));
        assert!(grid.is_after_refinance(37));
    }

    #[test]
    fn test_mortgage_windows_never_overlap() {
        let grid = TimeGrid::new(10, Some(50), Some(60));
        for month in grid.months() {
            let both = grid.is_active(Tranche::InitialMortgage, month)
                && grid.is_active(Tranche::Refinanced, month);
            assert!(!both, "both mortgages active at month {}", month);
        }
    }

    #[test]
    fn test_refinance_beyond_horizon() {
        let grid = TimeGrid::new(2, Some(48), None);
        assert!(grid.is_active(Tranche::InitialMortgage, 24));
        assert!(grid.window(Tranche::Refinanced).iter().all(|&k| k == 0));
    }

    #[test]
    fn test_home_equity_window_bounded_by_term() {
        let grid = TimeGrid::new(10, Some(12), Some(60));
        assert!(!grid.is_active(Tranche::HomeEquity, 0));
        assert_eq!(grid.payment_index(Tranche::HomeEquity, 60), Some(60));
        assert!(!grid.is_active(Tranche::HomeEquity, 61));
    }

    #[test]
    fn test_month_helpers() {
        let grid = TimeGrid::new(3, None, None);
        assert!(grid.is_origination_month(0));
        assert!(grid.is_terminal_month(36));
        assert!(!grid.is_annual_booking_month(0));
        assert!(grid.is_annual_booking_month(12));
        assert!(!grid.is_annual_booking_month(13));
        assert_eq!(grid.rent_year(0), 0);
        assert_eq!(grid.rent_year(12), 0);
        assert_eq!(grid.rent_year(13), 1);
        assert_eq!(grid.investment_year(12), 1);
        assert_eq!(grid.investment_year(13), 2);

        let closing = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            grid.calendar_month(closing, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
