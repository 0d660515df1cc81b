use serde::{Deserialize, Serialize};

use super::config::ValuationConfig;

/// Where the near-term growth rate came from. Display only; no numeric effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthProvenance {
    Provider,
    Default,
}

impl GrowthProvenance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    pub rate: f64,
    pub provenance: GrowthProvenance,
}

impl GrowthEstimate {
    /// Quarterly earnings growth if strictly positive, otherwise the configured default.
    pub fn resolve(config: &ValuationConfig, quarterly_earnings_growth: Option<f64>) -> Self {
        match quarterly_earnings_growth {
            Some(rate) if rate.is_finite() && rate > 0.0 => Self {
                rate,
                provenance: GrowthProvenance::Provider,
            },
            _ => Self {
                rate: config.default_growth_rate(),
                provenance: GrowthProvenance::Default,
            },
        }
    }
}

/// Per-year growth rates, indexed from year 1.
///
/// Years past the end of the schedule reuse its last rate, which is always the
/// terminal growth rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GrowthSchedule {
    rates: Vec<f64>,
}

impl GrowthSchedule {
    /// Five-step earnings schedule: near, near, near/2, near/2, terminal.
    pub fn earnings(near_term: f64, terminal: f64) -> Self {
        let half = near_term / 2.0;
        Self {
            rates: vec![near_term, near_term, half, half, terminal],
        }
    }

    /// Cash-flow schedule: years 1-5 near-term, 6-10 half, the rest terminal.
    pub fn cash_flow(near_term: f64, terminal: f64, years: u32) -> Self {
        let rates = (1..=years.max(1))
            .map(|year| match year {
                1..=5 => near_term,
                6..=10 => near_term / 2.0,
                _ => terminal,
            })
            .collect();
        Self { rates }
    }

    pub fn rate_for_year(&self, year: u32) -> f64 {
        let index = (year.max(1) as usize - 1).min(self.rates.len() - 1);
        self.rates[index]
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
