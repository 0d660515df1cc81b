use serde::{Deserialize, Serialize};

use super::error::ValuationError;

/// Perpetuity-growth terminal value and how much of it made it into intrinsic value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalValue {
    /// `last_projected * (1 + g) / (r - g)` at the end of the horizon.
    pub undiscounted: f64,
    /// `undiscounted` times the final year's discount factor.
    pub discounted: f64,
    /// Amount added to intrinsic value; equals `discounted` unless capped.
    pub contribution: f64,
    pub capped: bool,
}

/// Fails with [`ValuationError::Domain`] unless `discount_rate > terminal_growth`.
pub fn ensure_discount_exceeds_growth(
    discount_rate: f64,
    terminal_growth: f64,
) -> Result<(), ValuationError> {
    // Also rejects NaN inputs: every comparison with NaN is false.
    if discount_rate > terminal_growth {
        Ok(())
    } else {
        Err(ValuationError::Domain {
            discount_rate,
            terminal_growth,
        })
    }
}

pub fn perpetuity_value(
    last_projected: f64,
    discount_rate: f64,
    terminal_growth: f64,
) -> Result<f64, ValuationError> {
    ensure_discount_exceeds_growth(discount_rate, terminal_growth)?;
    Ok(last_projected * (1.0 + terminal_growth) / (discount_rate - terminal_growth))
}

impl TerminalValue {
    /// Computes the terminal value and applies the single-pass cap.
    ///
    /// When the discounted terminal exceeds `cap_ratio` of the naive total
    /// (`sum_discounted + discounted`), the contribution is set so that it equals exactly
    /// `cap_ratio` of the resulting intrinsic value:
    /// `c = cap_ratio * (sum_discounted + c)`, i.e. `c = sum_discounted * cap_ratio / (1 - cap_ratio)`.
    pub fn compute(
        last_projected: f64,
        final_discount_factor: f64,
        sum_discounted: f64,
        discount_rate: f64,
        terminal_growth: f64,
        cap_ratio: f64,
    ) -> Result<Self, ValuationError> {
        let undiscounted = perpetuity_value(last_projected, discount_rate, terminal_growth)?;
        let discounted = undiscounted * final_discount_factor;
        let naive_total = sum_discounted + discounted;

        let exceeds_cap = naive_total > 0.0 && discounted / naive_total > cap_ratio;
        let (contribution, capped) = if exceeds_cap {
            (sum_discounted * cap_ratio / (1.0 - cap_ratio), true)
        } else {
            (discounted, false)
        };

        Ok(Self {
            undiscounted,
            discounted,
            contribution,
            capped,
        })
    }
}
