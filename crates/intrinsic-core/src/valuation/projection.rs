use serde::{Deserialize, Serialize};

use super::growth::GrowthSchedule;

/// One forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: u32,
    pub growth_rate: f64,
    pub projected_value: f64,
    /// `(1 + discount_rate)^-year`
    pub discount_factor: f64,
    pub discounted_value: f64,
}

pub fn discount_factor(discount_rate: f64, year: u32) -> f64 {
    (1.0 + discount_rate).powi(-(year as i32))
}

/// Projects `base` over `years` and discounts each year to present value.
///
/// Year `t` compounds the base directly at that year's rate, `base * (1 + g_t)^t`,
/// rather than chaining the previous year's value.
pub fn project(
    base: f64,
    schedule: &GrowthSchedule,
    discount_rate: f64,
    years: u32,
) -> Vec<ProjectionRow> {
    (1..=years)
        .map(|year| {
            let growth_rate = schedule.rate_for_year(year);
            let projected_value = base * (1.0 + growth_rate).powi(year as i32);
            let discount_factor = discount_factor(discount_rate, year);
            ProjectionRow {
                year,
                growth_rate,
                projected_value,
                discount_factor,
                discounted_value: projected_value * discount_factor,
            }
        })
        .collect()
}

pub fn sum_discounted(rows: &[ProjectionRow]) -> f64 {
    rows.iter().map(|row| row.discounted_value).sum()
}
