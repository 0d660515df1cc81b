use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ValidationError;

pub const RISK_FREE_RATE: f64 = 0.045;
pub const MARKET_RISK_PREMIUM: f64 = 0.025;
pub const TERMINAL_GROWTH_RATE: f64 = 0.04;
pub const FORECAST_YEARS: u32 = 20;
pub const TERMINAL_CAP_RATIO: f64 = 0.6;
pub const DEFAULT_GROWTH_RATE: f64 = 0.10;
pub const DEFAULT_BETA: f64 = 1.0;
pub const MIN_DISCOUNT_RATE: f64 = 0.03;
pub const MAX_DISCOUNT_RATE: f64 = 0.15;

pub const ENV_RISK_FREE_RATE: &str = "INTRINSIC_RISK_FREE_RATE";
pub const ENV_MARKET_RISK_PREMIUM: &str = "INTRINSIC_MARKET_RISK_PREMIUM";
pub const ENV_TERMINAL_GROWTH: &str = "INTRINSIC_TERMINAL_GROWTH";

/// Inclusive range accepted for a caller-supplied discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBounds {
    pub min: f64,
    pub max: f64,
}

impl RateBounds {
    pub fn check(self, rate: f64) -> Result<f64, ValidationError> {
        if !rate.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "discount_rate",
            });
        }
        if rate < self.min || rate > self.max {
            return Err(ValidationError::DiscountRateOutOfRange {
                value: rate,
                min: self.min,
                max: self.max,
            });
        }
        Ok(rate)
    }
}

/// Process-wide valuation constants.
///
/// Only built through [`Default`], [`from_env`](Self::from_env) and the `with_*` setters,
/// so the horizon is always at least one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationConfig {
    risk_free_rate: f64,
    market_risk_premium: f64,
    terminal_growth_rate: f64,
    forecast_years: u32,
    terminal_cap_ratio: f64,
    default_growth_rate: f64,
    default_beta: f64,
    discount_rate_bounds: RateBounds,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: RISK_FREE_RATE,
            market_risk_premium: MARKET_RISK_PREMIUM,
            terminal_growth_rate: TERMINAL_GROWTH_RATE,
            forecast_years: FORECAST_YEARS,
            terminal_cap_ratio: TERMINAL_CAP_RATIO,
            default_growth_rate: DEFAULT_GROWTH_RATE,
            default_beta: DEFAULT_BETA,
            discount_rate_bounds: RateBounds {
                min: MIN_DISCOUNT_RATE,
                max: MAX_DISCOUNT_RATE,
            },
        }
    }
}

impl ValuationConfig {
    /// Defaults, with market inputs overridden from `INTRINSIC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    ///
    /// Unparseable or non-finite values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| -> Option<f64> {
            let raw = lookup(name)?;
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => {
                    warn!(variable = name, value = %raw, "ignoring invalid rate override");
                    None
                }
            }
        };

        let mut config = Self::default();
        if let Some(rate) = read(ENV_RISK_FREE_RATE) {
            config.risk_free_rate = rate;
        }
        if let Some(premium) = read(ENV_MARKET_RISK_PREMIUM) {
            config.market_risk_premium = premium;
        }
        if let Some(growth) = read(ENV_TERMINAL_GROWTH) {
            config.terminal_growth_rate = growth;
        }
        config
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_market_risk_premium(mut self, premium: f64) -> Self {
        self.market_risk_premium = premium;
        self
    }

    pub fn with_terminal_growth_rate(mut self, rate: f64) -> Self {
        self.terminal_growth_rate = rate;
        self
    }

    /// Horizon in years; at least one year is always projected.
    pub fn with_forecast_years(mut self, years: u32) -> Self {
        self.forecast_years = years.max(1);
        self
    }

    pub fn with_discount_rate_bounds(mut self, min: f64, max: f64) -> Self {
        self.discount_rate_bounds = RateBounds { min, max };
        self
    }

    pub const fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub const fn market_risk_premium(&self) -> f64 {
        self.market_risk_premium
    }

    pub const fn terminal_growth_rate(&self) -> f64 {
        self.terminal_growth_rate
    }

    pub const fn forecast_years(&self) -> u32 {
        self.forecast_years
    }

    pub const fn terminal_cap_ratio(&self) -> f64 {
        self.terminal_cap_ratio
    }

    pub const fn default_growth_rate(&self) -> f64 {
        self.default_growth_rate
    }

    pub const fn default_beta(&self) -> f64 {
        self.default_beta
    }

    pub const fn discount_rate_bounds(&self) -> RateBounds {
        self.discount_rate_bounds
    }
}
