//! Sources and uses of funds at closing
//!
//! Equity is the plug: whatever the financing does not cover.

use serde::{Deserialize, Serialize};

use crate::config::PropertyConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesAndUses {
    // Uses
    pub purchase_price: f64,
    pub closing_costs: f64,
    /// Origination fees on the initial mortgage and home-equity loan
    pub origination_fees: f64,
    pub total_uses: f64,

    // Sources
    pub down_payment: f64,
    pub initial_mortgage: f64,
    pub home_equity: f64,
    pub total_financing: f64,
    /// Equity check at closing. Negative when over-levered, which is a valid input.
    pub equity: f64,
    pub total_sources: f64,
}

impl SourcesAndUses {
    /// Size the deal.
    ///
    /// `home_equity` is `Some((amount, fee_rate))` when the home-equity loan is drawn.
    pub fn calculate(
        purchase_price: f64,
        down_payment_fraction: f64,
        closing_costs: f64,
        initial_mortgage_fee_rate: f64,
        home_equity: Option<(f64, f64)>,
    ) -> Self {
        let down_payment = purchase_price * down_payment_fraction;
        let initial_mortgage = purchase_price - down_payment;

        let (hel_amount, hel_fee) = home_equity
            .map(|(amount, fee_rate)| (amount, amount * fee_rate))
            .unwrap_or((0.0, 0.0));

        let origination_fees = initial_mortgage * initial_mortgage_fee_rate + hel_fee;
        let total_uses = purchase_price + closing_costs + origination_fees;
        let total_financing = initial_mortgage + hel_amount;
        let equity = total_uses - total_financing;
        let total_sources = equity + total_financing;

        Self {
            purchase_price,
            closing_costs,
            origination_fees,
            total_uses,
            down_payment,
            initial_mortgage,
            home_equity: hel_amount,
            total_financing,
            equity,
            total_sources,
        }
    }

    pub fn from_config(config: &PropertyConfig) -> Self {
        Self::calculate(
            config.purchase_price,
            config.down_payment_fraction,
            config.closing_costs,
            config.initial_mortgage_fee_rate,
            config.home_equity.as_ref().map(|h| (h.amount, h.fee_rate)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basic_sizing() {
        let su = SourcesAndUses::calculate(500_000.0, 0.25, 10_000.0, 0.01, None);
        assert_relative_eq!(su.down_payment, 125_000.0);
        assert_relative_eq!(su.initial_mortgage, 375_000.0);
        assert_relative_eq!(su.origination_fees, 3_750.0);
        assert_relative_eq!(su.total_uses, 513_750.0);
        assert_relative_eq!(su.equity, 138_750.0);
        assert_eq!(su.home_equity, 0.0);
    }

    #[test]
    fn test_home_equity_reduces_equity() {
        let without = SourcesAndUses::calculate(400_000.0, 0.2, 8_000.0, 0.01, None);
        let with = SourcesAndUses::calculate(400_000.0, 0.2, 8_000.0, 0.01, Some((50_000.0, 0.02)));
        assert_relative_eq!(with.origination_fees, without.origination_fees + 1_000.0);
        assert_relative_eq!(with.equity, without.equity - 50_000.0 + 1_000.0);
    }

    #[test]
    fn test_sources_equal_uses_across_inputs() {
        let prices = [100_000.0, 347_500.0, 1_250_000.0];
        let fractions = [0.0, 0.035, 0.2, 0.5, 1.0];
        let helocs = [None, Some((25_000.0, 0.015)), Some((900_000.0, 0.0))];

        for &price in &prices {
            for &fraction in &fractions {
                for &hel in &helocs {
                    let su = SourcesAndUses::calculate(price, fraction, 7_500.0, 0.0125, hel);
                    assert_relative_eq!(su.total_sources, su.total_uses, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_over_levered_equity_is_negative() {
        let su = SourcesAndUses::calculate(200_000.0, 0.1, 0.0, 0.0, Some((100_000.0, 0.0)));
        assert!(su.equity < 0.0);
        assert_relative_eq!(su.total_sources, su.total_uses);
    }
}
