use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::balance_sheet::BalanceSheetAdjustment;
use super::config::ValuationConfig;
use super::discount::DiscountRate;
use super::error::{RequiredField, ValuationError};
use super::growth::{GrowthEstimate, GrowthSchedule};
use super::projection::{project, sum_discounted, ProjectionRow};
use super::terminal::{ensure_discount_exceeds_growth, TerminalValue};
use crate::{FundamentalSnapshot, Ticker, ValidationError};

/// The two valuation strategies. They differ on purpose: only the EPS method adds a
/// capped terminal value, and only the OCF method reports a per-share figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMethod {
    #[serde(rename = "eps")]
    EpsBased,
    #[serde(rename = "ocf")]
    OcfBased,
}

impl ValuationMethod {
    pub const ALL: [Self; 2] = [Self::EpsBased, Self::OcfBased];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EpsBased => "eps",
            Self::OcfBased => "ocf",
        }
    }
}

impl Display for ValuationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eps" => Ok(Self::EpsBased),
            "ocf" => Ok(Self::OcfBased),
            other => Err(ValidationError::InvalidMethod {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub method: ValuationMethod,
    pub ticker: Ticker,
    /// Rounded to cents. Aggregate for [`ValuationMethod::EpsBased`], per share for
    /// [`ValuationMethod::OcfBased`].
    pub intrinsic_value: f64,
    pub unrounded_value: f64,
    pub discount: DiscountRate,
    pub growth: GrowthEstimate,
    pub schedule: GrowthSchedule,
    pub rows: Vec<ProjectionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_sheet: Option<BalanceSheetAdjustment>,
}

impl ValuationResult {
    pub fn projected_values(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.projected_value).collect()
    }

    pub fn discounted_values(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.discounted_value).collect()
    }
}

/// Pure valuation arithmetic over a [`FundamentalSnapshot`].
///
/// Holds no state besides its configuration, so one engine can serve any number of
/// concurrent valuations.
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// CAPM rate from the snapshot's beta, superseded by `override_rate` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the override is non-finite or outside the
    /// configured bounds.
    pub fn discount_rate(
        &self,
        snapshot: &FundamentalSnapshot,
        override_rate: Option<f64>,
    ) -> Result<DiscountRate, ValidationError> {
        DiscountRate::derive(&self.config, snapshot.beta).with_override(&self.config, override_rate)
    }

    pub fn growth(&self, snapshot: &FundamentalSnapshot) -> GrowthEstimate {
        GrowthEstimate::resolve(&self.config, snapshot.quarterly_earnings_growth)
    }

    /// Runs one valuation strategy.
    ///
    /// # Errors
    ///
    /// - [`ValuationError::InvalidInput`] for a rejected override
    /// - [`ValuationError::MissingData`] when the method's base or share count is absent
    ///   or not positive
    /// - [`ValuationError::Domain`] when the discount rate does not exceed terminal growth
    /// - [`ValuationError::NonFinite`] when the arithmetic overflows
    pub fn value(
        &self,
        method: ValuationMethod,
        snapshot: &FundamentalSnapshot,
        override_rate: Option<f64>,
    ) -> Result<ValuationResult, ValuationError> {
        let discount = self.discount_rate(snapshot, override_rate)?;
        let growth = self.growth(snapshot);
        debug!(
            symbol = %snapshot.ticker,
            method = method.as_str(),
            beta = discount.beta,
            discount_rate = discount.effective(),
            growth_rate = growth.rate,
            growth_provenance = growth.provenance.as_str(),
            "resolved valuation inputs"
        );

        let result = match method {
            ValuationMethod::EpsBased => self.value_eps(snapshot, discount, growth),
            ValuationMethod::OcfBased => self.value_ocf(snapshot, discount, growth),
        }?;
        if !result.unrounded_value.is_finite() {
            return Err(ValuationError::NonFinite {
                value: result.unrounded_value,
            });
        }

        info!(
            symbol = %snapshot.ticker,
            method = method.as_str(),
            intrinsic_value = result.intrinsic_value,
            "valuation complete"
        );
        Ok(result)
    }

    fn value_eps(
        &self,
        snapshot: &FundamentalSnapshot,
        discount: DiscountRate,
        growth: GrowthEstimate,
    ) -> Result<ValuationResult, ValuationError> {
        let eps = require_positive(snapshot.eps, RequiredField::Eps)?;
        let rate = discount.effective();
        let terminal_growth = self.config.terminal_growth_rate();
        ensure_discount_exceeds_growth(rate, terminal_growth)?;

        let schedule = GrowthSchedule::earnings(growth.rate, terminal_growth);
        let rows = project(eps, &schedule, rate, self.config.forecast_years());
        let sum = sum_discounted(&rows);
        let (last_projected, final_factor) = rows
            .last()
            .map_or((eps, 1.0), |row| (row.projected_value, row.discount_factor));

        let terminal = TerminalValue::compute(
            last_projected,
            final_factor,
            sum,
            rate,
            terminal_growth,
            self.config.terminal_cap_ratio(),
        )?;
        if terminal.capped {
            debug!(
                symbol = %snapshot.ticker,
                discounted_terminal = terminal.discounted,
                capped_terminal = terminal.contribution,
                "terminal value capped"
            );
        }

        let unrounded_value = sum + terminal.contribution;
        Ok(ValuationResult {
            method: ValuationMethod::EpsBased,
            ticker: snapshot.ticker.clone(),
            intrinsic_value: round_cents(unrounded_value),
            unrounded_value,
            discount,
            growth,
            schedule,
            rows,
            terminal: Some(terminal),
            balance_sheet: None,
        })
    }

    fn value_ocf(
        &self,
        snapshot: &FundamentalSnapshot,
        discount: DiscountRate,
        growth: GrowthEstimate,
    ) -> Result<ValuationResult, ValuationError> {
        let ocf = require_positive(snapshot.operating_cashflow, RequiredField::OperatingCashflow)?;
        let shares = require_positive(snapshot.shares_outstanding, RequiredField::SharesOutstanding)?;
        let rate = discount.effective();
        let terminal_growth = self.config.terminal_growth_rate();
        ensure_discount_exceeds_growth(rate, terminal_growth)?;

        let years = self.config.forecast_years();
        let schedule = GrowthSchedule::cash_flow(growth.rate, terminal_growth, years);
        let rows = project(ocf, &schedule, rate, years);
        let adjustment = BalanceSheetAdjustment::compute(sum_discounted(&rows), shares, snapshot);

        let unrounded_value = adjustment.final_value;
        Ok(ValuationResult {
            method: ValuationMethod::OcfBased,
            ticker: snapshot.ticker.clone(),
            intrinsic_value: round_cents(unrounded_value),
            unrounded_value,
            discount,
            growth,
            schedule,
            rows,
            terminal: None,
            balance_sheet: Some(adjustment),
        })
    }
}

fn require_positive(value: Option<f64>, field: RequiredField) -> Result<f64, ValuationError> {
    value
        .filter(|value| value.is_finite() && *value > 0.0)
        .ok_or(ValuationError::MissingData { field })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
