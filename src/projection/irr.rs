//! Return solvers: XIRR over month-indexed cash flows and MOIC
//!
//! Discounting uses a month-offset day count, so a flow at month `m` is
//! discounted by `(1 + r)^(m / 12)` and the solved rate is an effective annual
//! rate.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// NPV magnitude below which the solver accepts a rate
pub const XIRR_TOLERANCE: f64 = 1e-7;

pub const XIRR_MAX_ITERATIONS: u32 = 100;

/// Starting rate used by the engine when the configuration does not supply one
pub const DEFAULT_IRR_GUESS: f64 = 0.2;

/// Net present value of `values` at `months`, discounted at annual `rate`
pub fn npv(values: &[f64], months: &[u32], rate: f64) -> f64 {
    values
        .iter()
        .zip(months)
        .map(|(&value, &month)| value / (1.0 + rate).powf(month as f64 / 12.0))
        .sum()
}

/// Finite-difference step for the NPV derivative. Relative to the rate, with a
/// fixed floor so a rate of exactly zero still gets a usable step.
fn derivative_step(rate: f64) -> f64 {
    if rate.abs() > 1e-6 {
        rate * 1e-6
    } else {
        1e-6
    }
}

/// Highest rate the solver steps to
pub const XIRR_MAX_RATE: f64 = 10.0;

/// Halvings allowed when pulling a Newton step back into the domain
const MAX_STEP_HALVINGS: u32 = 64;

/// Two rates whose NPVs have opposite signs
#[derive(Debug, Clone, Copy)]
struct Bracket {
    low: f64,
    low_npv: f64,
    high: f64,
    high_npv: f64,
}

impl Bracket {
    fn new(a: f64, a_npv: f64, b: f64, b_npv: f64) -> Self {
        if a < b {
            Self { low: a, low_npv: a_npv, high: b, high_npv: b_npv }
        } else {
            Self { low: b, low_npv: b_npv, high: a, high_npv: a_npv }
        }
    }

    fn width(&self) -> f64 {
        self.high - self.low
    }

    fn midpoint(&self) -> f64 {
        0.5 * (self.low + self.high)
    }

    fn contains(&self, rate: f64) -> bool {
        rate > self.low && rate < self.high
    }

    /// Endpoint with the smaller NPV magnitude
    fn best(&self) -> f64 {
        if self.low_npv.abs() <= self.high_npv.abs() {
            self.low
        } else {
            self.high
        }
    }

    /// Replace the endpoint on the same side of the root as `rate`
    fn narrow(self, rate: f64, value: f64) -> Self {
        if value.signum() == self.low_npv.signum() {
            Self { low: rate, low_npv: value, ..self }
        } else {
            Self { high: rate, high_npv: value, ..self }
        }
    }
}

/// Move a Newton candidate back toward `from` until it sits above -100% with a
/// finite NPV. Candidates above `XIRR_MAX_RATE` are clamped to it.
fn damp_into_domain(values: &[f64], months: &[u32], from: f64, candidate: f64) -> Option<(f64, f64)> {
    let mut rate = if candidate.is_finite() {
        candidate.min(XIRR_MAX_RATE)
    } else if candidate > 0.0 {
        XIRR_MAX_RATE
    } else {
        -1.0
    };

    for _ in 0..=MAX_STEP_HALVINGS {
        if rate > -1.0 {
            let value = npv(values, months, rate);
            if value.is_finite() {
                return Some((rate, value));
            }
        }
        rate = 0.5 * (from + rate);
    }
    None
}

/// Solve `Σ v[i] / (1+r)^(m[i]/12) = 0` for `r` by Newton-Raphson with a
/// numerical derivative.
///
/// Iterates stay in `(-1, XIRR_MAX_RATE]`: a step that would leave the domain
/// is halved back toward the previous rate. Once two iterates straddle the
/// root they form a bracket, and any Newton step that leaves the bracket or
/// fails to halve the previous step is replaced by bisection.
///
/// Returns `Convergence` when the iteration budget runs out. `Divergence` is
/// reserved for a guess outside the domain and for a vanishing derivative
/// before any bracket exists.
pub fn xirr(values: &[f64], months: &[u32], guess: f64) -> Result<f64> {
    if values.len() != months.len() {
        return Err(ProjectionError::LengthMismatch {
            values: values.len(),
            months: months.len(),
        });
    }

    let mut rate = guess.min(XIRR_MAX_RATE);
    let mut value = npv(values, months, rate);
    if !(guess > -1.0) || !value.is_finite() {
        warn!("XIRR guess {} is outside the domain", guess);
        return Err(ProjectionError::Divergence { iteration: 0, rate: guess });
    }

    let mut bracket: Option<Bracket> = None;
    let mut last_step = f64::INFINITY;

    for iteration in 0..XIRR_MAX_ITERATIONS {
        if value.abs() < XIRR_TOLERANCE {
            return Ok(rate);
        }
        if let Some(b) = bracket.filter(|b| b.width() < XIRR_TOLERANCE) {
            return Ok(b.best());
        }

        let step = derivative_step(rate);
        let derivative = (npv(values, months, rate + step) - value) / step;
        let newton = (derivative != 0.0 && derivative.is_finite()).then(|| rate - value / derivative);

        let (next, next_value) = match (bracket, newton) {
            (Some(b), Some(candidate)) if b.contains(candidate) && (candidate - rate).abs() < 0.5 * last_step => {
                (candidate, npv(values, months, candidate))
            }
            (Some(b), _) => {
                let mid = b.midpoint();
                (mid, npv(values, months, mid))
            }
            (None, Some(candidate)) => match damp_into_domain(values, months, rate, candidate) {
                Some(point) => point,
                None => {
                    warn!("XIRR step could not be pulled into the domain at iteration {}", iteration);
                    return Err(ProjectionError::Divergence { iteration, rate: candidate });
                }
            },
            (None, None) => {
                warn!("XIRR derivative vanished at iteration {} (rate {})", iteration, rate);
                return Err(ProjectionError::Divergence { iteration, rate });
            }
        };

        bracket = match bracket {
            Some(b) => Some(b.narrow(next, next_value)),
            None if next_value.signum() != value.signum() => Some(Bracket::new(rate, value, next, next_value)),
            None => None,
        };
        last_step = (next - rate).abs();
        rate = next;
        value = next_value;
    }

    warn!(
        "XIRR did not converge in {} iterations (rate {}, npv {})",
        XIRR_MAX_ITERATIONS, rate, value
    );
    Err(ProjectionError::Convergence {
        iterations: XIRR_MAX_ITERATIONS,
        rate,
        npv: value,
    })
}

/// Investor cash flows for XIRR: levered FCF with the closing equity out at
/// month 0 and the net sale proceeds in at the last month
pub fn equity_cash_flows(levered_fcf: &[f64], initial_equity: f64, net_sale_proceeds: f64) -> Vec<f64> {
    let mut flows = levered_fcf.to_vec();
    if let Some(first) = flows.first_mut() {
        *first -= initial_equity;
    }
    if let Some(last) = flows.last_mut() {
        *last += net_sale_proceeds;
    }
    flows
}

/// Multiple on invested capital
///
/// (positive levered FCF + net sale proceeds) / (initial equity + additional
/// equity draws). Not finite when nothing was invested.
pub fn moic(levered_fcf: &[f64], net_sale_proceeds: f64, initial_equity: f64, additional_equity: &[f64]) -> f64 {
    let returned: f64 = levered_fcf.iter().map(|&v| v.max(0.0)).sum::<f64>() + net_sale_proceeds;
    let invested: f64 = initial_equity + additional_equity.iter().sum::<f64>();
    returned / invested
}

/// Return metrics of one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// Vector fed to the XIRR solver, aligned with the grid months
    pub cash_flows: Vec<f64>,
    pub irr: f64,
    pub moic: f64,
    /// Return on equity; reported as the IRR of the equity cash flows
    pub roe: f64,
}

impl ReturnMetrics {
    pub fn solve(
        levered_fcf: &[f64],
        additional_equity: &[f64],
        months: &[u32],
        initial_equity: f64,
        net_sale_proceeds: f64,
        guess: f64,
    ) -> Result<Self> {
        let cash_flows = equity_cash_flows(levered_fcf, initial_equity, net_sale_proceeds);
        let irr = xirr(&cash_flows, months, guess)?;
        let moic = moic(levered_fcf, net_sale_proceeds, initial_equity, additional_equity);

        Ok(Self { cash_flows, irr, moic, roe: irr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn months(len: usize) -> Vec<u32> {
        (0..len as u32).collect()
    }

    #[test]
    fn test_three_year_round_trip() {
        let mut values = vec![0.0; 37];
        values[0] = -1_000.0;
        values[36] = 1_610.51;

        let rate = xirr(&values, &months(37), DEFAULT_IRR_GUESS).unwrap();
        assert_abs_diff_eq!(rate, 0.17, epsilon = 0.005);
        assert_abs_diff_eq!(rate, 1.61051_f64.powf(1.0 / 3.0) - 1.0, epsilon = 1e-6);
        assert!(npv(&values, &months(37), rate).abs() < 1e-3);
    }

    #[test]
    fn test_one_year_ten_percent() {
        let mut values = vec![0.0; 13];
        values[0] = -1_000.0;
        values[12] = 1_100.0;

        let rate = xirr(&values, &months(13), 0.0).unwrap();
        assert_abs_diff_eq!(rate, 0.10, epsilon = 1e-6);
    }

    #[test]
    fn test_level_cashflows() {
        // Borrow 10,000 and repay 900 a month for a year
        let mut values = vec![10_000.0];
        values.extend(vec![-900.0; 12]);

        let rate = xirr(&values, &months(13), DEFAULT_IRR_GUESS).unwrap();
        assert!(rate > 0.0);
        assert!(npv(&values, &months(13), rate).abs() < 1e-3);
    }

    #[test]
    fn test_zero_guess_uses_floor_step() {
        let mut values = vec![0.0; 25];
        values[0] = -500.0;
        values[24] = 605.0;

        let rate = xirr(&values, &months(25), 0.0).unwrap();
        assert_abs_diff_eq!(rate, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_no_sign_change_fails() {
        // NPV stays positive, so every step pushes the rate up to the ceiling
        let values = vec![100.0, 100.0, 100.0];
        let err = xirr(&values, &months(3), DEFAULT_IRR_GUESS).unwrap_err();
        match err {
            ProjectionError::Convergence { iterations, rate, npv } => {
                assert_eq!(iterations, XIRR_MAX_ITERATIONS);
                assert_eq!(rate, XIRR_MAX_RATE);
                assert!(npv > 100.0);
            }
            other => panic!("expected Convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_all_outflows_exhaust_budget() {
        let mut values = vec![-100.0; 25];
        values[0] = -5_000.0;
        let err = xirr(&values, &months(25), DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::Convergence { iterations: 100, rate, .. } if rate == XIRR_MAX_RATE
        ));
    }

    #[test]
    fn test_deep_loss_solves_near_minus_one() {
        // Newton from 0.2 overshoots far below -100% and is pulled back
        let mut values = vec![0.0; 121];
        values[0] = -1_000_000.0;
        values[120] = 1e-3;

        let rate = xirr(&values, &months(121), DEFAULT_IRR_GUESS).unwrap();
        assert_abs_diff_eq!(rate, 10f64.powf(-0.9) - 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_overshoot_below_minus_one_recovers() {
        // -1000 then 100 three years later: about -53.6% a year
        let mut values = vec![0.0; 37];
        values[0] = -1_000.0;
        values[36] = 100.0;

        let rate = xirr(&values, &months(37), DEFAULT_IRR_GUESS).unwrap();
        assert_abs_diff_eq!(rate, 0.1_f64.powf(1.0 / 3.0) - 1.0, epsilon = 1e-6);
        assert!(rate > -1.0);
    }

    #[test]
    fn test_guess_outside_domain_diverges() {
        let values = vec![-1_000.0, 1_100.0];
        let err = xirr(&values, &[0, 12], -1.5).unwrap_err();
        assert!(matches!(err, ProjectionError::Divergence { iteration: 0, .. }));
    }

    #[test]
    fn test_flat_npv_diverges() {
        // A lone month-0 flow has no rate dependence at all
        let err = xirr(&[-5.0], &[0], DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, ProjectionError::Divergence { iteration: 0, .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = xirr(&[-1.0, 2.0], &[0], 0.1).unwrap_err();
        assert!(matches!(err, ProjectionError::LengthMismatch { values: 2, months: 1 }));
    }

    #[test]
    fn test_moic() {
        let levered = [0.0, 500.0, -200.0, 700.0];
        let additional = [0.0, 0.0, 200.0, 0.0];
        let multiple = moic(&levered, 10_000.0, 5_000.0, &additional);
        assert_relative_eq!(multiple, (1_200.0 + 10_000.0) / 5_200.0);
    }

    #[test]
    fn test_equity_cash_flows() {
        let flows = equity_cash_flows(&[0.0, 10.0, -5.0], 100.0, 250.0);
        assert_eq!(flows, vec![-100.0, 10.0, 245.0]);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let levered = [0.0, 50.0, 50.0, 50.0, 50.0];
        let additional = [0.0; 5];
        let first = ReturnMetrics::solve(&levered, &additional, &months(5), 1_000.0, 1_050.0, 0.2).unwrap();
        let second = ReturnMetrics::solve(&levered, &additional, &months(5), 1_000.0, 1_050.0, 0.2).unwrap();
        assert_eq!(first.irr.to_bits(), second.irr.to_bits());
        assert_eq!(first.roe, first.irr);
    }
}
