use serde::{Deserialize, Serialize};

use crate::{Ticker, UtcDateTime};

/// Point-in-time fundamentals for one ticker.
///
/// Every metric is independently optional. Absent, non-positive or non-finite values are
/// never an error here; the valuation resolvers decide what each one falls back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub ticker: Ticker,
    #[serde(default = "UtcDateTime::now")]
    pub as_of: UtcDateTime,
    /// Trailing twelve-month earnings per share.
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub operating_cashflow: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    /// Year-over-year growth of the latest quarter's earnings, as a ratio.
    #[serde(default)]
    pub quarterly_earnings_growth: Option<f64>,
    #[serde(default)]
    pub cash: Option<f64>,
    #[serde(default)]
    pub short_term_investments: Option<f64>,
    #[serde(default)]
    pub short_term_debt: Option<f64>,
    #[serde(default)]
    pub long_term_debt: Option<f64>,
    /// Preview only.
    #[serde(default)]
    pub net_income_to_common: Option<f64>,
    /// Preview only.
    #[serde(default)]
    pub capital_expenditures: Option<f64>,
}

impl FundamentalSnapshot {
    /// Snapshot with every metric absent, e.g. after a failed fetch.
    pub fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            as_of: UtcDateTime::now(),
            eps: None,
            operating_cashflow: None,
            shares_outstanding: None,
            beta: None,
            quarterly_earnings_growth: None,
            cash: None,
            short_term_investments: None,
            short_term_debt: None,
            long_term_debt: None,
            net_income_to_common: None,
            capital_expenditures: None,
        }
    }

    /// Drops NaN and infinite values so downstream arithmetic only sees finite inputs.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.eps,
            &mut self.operating_cashflow,
            &mut self.shares_outstanding,
            &mut self.beta,
            &mut self.quarterly_earnings_growth,
            &mut self.cash,
            &mut self.short_term_investments,
            &mut self.short_term_debt,
            &mut self.long_term_debt,
            &mut self.net_income_to_common,
            &mut self.capital_expenditures,
        ] {
            *field = (*field).filter(|value| value.is_finite());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.eps.is_none()
            && self.operating_cashflow.is_none()
            && self.shares_outstanding.is_none()
            && self.beta.is_none()
            && self.quarterly_earnings_growth.is_none()
            && self.cash.is_none()
            && self.short_term_investments.is_none()
            && self.short_term_debt.is_none()
            && self.long_term_debt.is_none()
            && self.net_income_to_common.is_none()
            && self.capital_expenditures.is_none()
    }
}
