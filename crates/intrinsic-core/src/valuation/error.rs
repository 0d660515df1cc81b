use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SourceError, ValidationError};

/// Fundamentals a valuation method cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Eps,
    OperatingCashflow,
    SharesOutstanding,
}

impl RequiredField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eps => "eps",
            Self::OperatingCashflow => "operating_cashflow",
            Self::SharesOutstanding => "shares_outstanding",
        }
    }
}

impl Display for RequiredField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a valuation produced no number.
///
/// None of these are fatal to the caller; each one is scoped to a single valuation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    #[error("valuation unavailable: {field} is missing or not positive")]
    MissingData { field: RequiredField },

    #[error("discount rate {discount_rate} must exceed terminal growth rate {terminal_growth}")]
    Domain {
        discount_rate: f64,
        terminal_growth: f64,
    },

    /// Finite inputs that overflow, e.g. a huge base over a tiny share count.
    #[error("valuation produced a non-finite value ({value})")]
    NonFinite { value: f64 },

    /// The fetch failed, so the required field was absent for that reason.
    #[error("valuation unavailable: {field} could not be fetched: {source}")]
    Provider {
        field: RequiredField,
        source: SourceError,
    },

    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
}

impl ValuationError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingData { .. } => "valuation.missing_data",
            Self::Domain { .. } => "valuation.domain",
            Self::NonFinite { .. } => "valuation.non_finite",
            Self::Provider { .. } => "valuation.provider",
            Self::InvalidInput(_) => "valuation.invalid_input",
        }
    }
}
