use serde::{Deserialize, Serialize};

use super::config::ValuationConfig;
use crate::ValidationError;

/// Where the beta behind a derived discount rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaSource {
    Provider,
    Default,
}

/// CAPM discount rate plus the optional caller override that supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRate {
    pub risk_free_rate: f64,
    pub market_risk_premium: f64,
    pub beta: f64,
    pub beta_source: BetaSource,
    /// `risk_free_rate + beta * market_risk_premium`. Informational once overridden.
    pub derived_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_rate: Option<f64>,
}

impl DiscountRate {
    /// Derives the rate from a provider beta. Absent or non-positive beta uses the default.
    pub fn derive(config: &ValuationConfig, beta: Option<f64>) -> Self {
        let (beta, beta_source) = match beta {
            Some(beta) if beta.is_finite() && beta > 0.0 => (beta, BetaSource::Provider),
            _ => (config.default_beta(), BetaSource::Default),
        };

        Self {
            risk_free_rate: config.risk_free_rate(),
            market_risk_premium: config.market_risk_premium(),
            beta,
            beta_source,
            derived_rate: config.risk_free_rate() + beta * config.market_risk_premium(),
            override_rate: None,
        }
    }

    /// Applies a caller override after checking it against the configured bounds.
    pub fn with_override(
        mut self,
        config: &ValuationConfig,
        rate: Option<f64>,
    ) -> Result<Self, ValidationError> {
        self.override_rate = rate
            .map(|rate| config.discount_rate_bounds().check(rate))
            .transpose()?;
        Ok(self)
    }

    /// The rate every downstream calculation uses.
    pub fn effective(&self) -> f64 {
        self.override_rate.unwrap_or(self.derived_rate)
    }

    pub fn is_overridden(&self) -> bool {
        self.override_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ValuationConfig {
        ValuationConfig::default()
    }

    #[test]
    fn uses_provider_beta_when_positive() {
        let rate = DiscountRate::derive(&config(), Some(1.2));
        assert_eq!(rate.beta, 1.2);
        assert_eq!(rate.beta_source, BetaSource::Provider);
        assert!((rate.effective() - 0.075).abs() < 1e-12);
    }

    #[test]
    fn absent_or_non_positive_beta_falls_back_to_one() {
        for beta in [None, Some(0.0), Some(-0.4), Some(f64::NAN)] {
            let rate = DiscountRate::derive(&config(), beta);
            assert_eq!(rate.beta, 1.0, "beta input {beta:?}");
            assert_eq!(rate.beta_source, BetaSource::Default);
            assert_eq!(rate.derived_rate, 0.045 + 0.025);
        }
    }

    #[test]
    fn override_supersedes_derived_rate() {
        let rate = DiscountRate::derive(&config(), Some(1.5))
            .with_override(&config(), Some(0.09))
            .expect("override in range");

        assert!(rate.is_overridden());
        assert_eq!(rate.effective(), 0.09);
        assert!((rate.derived_rate - 0.0825).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let err = DiscountRate::derive(&config(), None)
            .with_override(&config(), Some(0.2))
            .expect_err("0.2 exceeds the policy range");
        assert!(matches!(err, ValidationError::DiscountRateOutOfRange { .. }));
    }
}
