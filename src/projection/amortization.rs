//! Level-payment amortization formulas
//!
//! Amounts are positive magnitudes. Every formula carries an explicit
//! zero-rate branch so a 0% loan degenerates to straight-line principal
//! instead of dividing by zero.

/// Level monthly payment retiring `principal` over `term_months` at `monthly_rate`
pub fn level_payment(monthly_rate: f64, term_months: u32, principal: f64) -> f64 {
    if term_months == 0 {
        return 0.0;
    }
    if monthly_rate == 0.0 {
        return principal / term_months as f64;
    }

    let growth = (1.0 + monthly_rate).powi(term_months as i32);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Scheduled balance after `payments_made` level payments
pub fn scheduled_balance(monthly_rate: f64, term_months: u32, principal: f64, payments_made: u32) -> f64 {
    let payment = level_payment(monthly_rate, term_months, principal);
    if monthly_rate == 0.0 {
        return principal - payment * payments_made as f64;
    }

    let growth = (1.0 + monthly_rate).powi(payments_made as i32);
    principal * growth - payment * (growth - 1.0) / monthly_rate
}

/// Principal component of payment number `period` (1-based).
///
/// Returns 0 outside `1..=term_months`, so a tranche keeps its bank schedule
/// and simply stops amortizing past its own term.
pub fn scheduled_principal(monthly_rate: f64, period: u32, term_months: u32, principal: f64) -> f64 {
    if period == 0 || period > term_months {
        return 0.0;
    }

    let payment = level_payment(monthly_rate, term_months, principal);
    let interest = scheduled_balance(monthly_rate, term_months, principal, period - 1) * monthly_rate;
    payment - interest
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_level_payment() {
        let pmt = level_payment(0.06 / 12.0, 240, 375_000.0);
        assert_abs_diff_eq!(pmt, 2_686.6165, epsilon = 1e-3);
    }

    #[test]
    fn test_first_principal_component() {
        let principal = scheduled_principal(0.005, 1, 240, 375_000.0);
        assert_abs_diff_eq!(principal, 811.6165, epsilon = 1e-3);
    }

    #[test]
    fn test_principal_components_sum_to_loan() {
        let total: f64 = (1..=360).map(|k| scheduled_principal(0.045 / 12.0, k, 360, 250_000.0)).sum();
        assert_relative_eq!(total, 250_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_scheduled_balance_midway() {
        let balance = scheduled_balance(0.005, 240, 375_000.0, 120);
        assert_abs_diff_eq!(balance, 241_992.823, epsilon = 1e-2);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        assert_relative_eq!(level_payment(0.0, 120, 60_000.0), 500.0);
        for k in 1..=120 {
            let remaining_term = 120 - (k - 1);
            let balance = scheduled_balance(0.0, 120, 60_000.0, k - 1);
            assert_relative_eq!(
                scheduled_principal(0.0, k, 120, 60_000.0),
                balance / remaining_term as f64,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_outside_term_is_zero() {
        assert_eq!(scheduled_principal(0.005, 0, 240, 375_000.0), 0.0);
        assert_eq!(scheduled_principal(0.005, 241, 240, 375_000.0), 0.0);
        assert_eq!(level_payment(0.005, 0, 375_000.0), 0.0);
    }
}
