//! Multi-stage DCF valuation.
//!
//! [`ValuationEngine`] is pure arithmetic over a [`FundamentalSnapshot`](crate::FundamentalSnapshot);
//! [`ValuationService`] adds the single provider fetch in front of it.

mod balance_sheet;
mod config;
mod discount;
mod engine;
mod error;
mod growth;
mod projection;
mod service;
mod terminal;

pub use balance_sheet::BalanceSheetAdjustment;
pub use config::{
    RateBounds, ValuationConfig, DEFAULT_BETA, DEFAULT_GROWTH_RATE, ENV_MARKET_RISK_PREMIUM,
    ENV_RISK_FREE_RATE, ENV_TERMINAL_GROWTH, FORECAST_YEARS, MARKET_RISK_PREMIUM,
    MAX_DISCOUNT_RATE, MIN_DISCOUNT_RATE, RISK_FREE_RATE, TERMINAL_CAP_RATIO,
    TERMINAL_GROWTH_RATE,
};
pub use discount::{BetaSource, DiscountRate};
pub use engine::{ValuationEngine, ValuationMethod, ValuationResult};
pub use error::{RequiredField, ValuationError};
pub use growth::{GrowthEstimate, GrowthProvenance, GrowthSchedule};
pub use projection::{discount_factor, project, ProjectionRow};
pub use service::{FetchedFundamentals, ValuationService};
pub use terminal::{perpetuity_value, TerminalValue};
