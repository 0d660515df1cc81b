//! Fundamentals provider contract.
//!
//! The valuation engine never talks to a market-data vendor directly. It consumes
//! [`FundamentalSnapshot`]s produced by a [`FundamentalsProvider`], and treats every
//! [`SourceError`] as "all fields absent".
//!
//! # Example
//!
//! ```rust,ignore
//! use intrinsic_core::{FundamentalsProvider, FundamentalsRequest, Ticker, YahooAdapter};
//!
//! async fn show(adapter: &YahooAdapter) -> Result<(), intrinsic_core::SourceError> {
//!     let request = FundamentalsRequest::new(Ticker::parse("AAPL")?);
//!     let snapshot = adapter.fundamentals(request).await?;
//!     println!("{}: eps={:?}", snapshot.ticker, snapshot.eps);
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{FundamentalSnapshot, ProviderId, Ticker, ValidationError};

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Health state reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime provider health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool) -> Self {
        Self {
            state,
            rate_available,
        }
    }

    pub const fn healthy() -> Self {
        Self::new(HealthState::Healthy, true)
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Internal,
}

/// Structured provider error.
///
/// `retryable` describes the failure only; nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(ticker: &Ticker) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: format!("no fundamentals available for '{ticker}'"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Request payload for a single-ticker fundamentals fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundamentalsRequest {
    pub ticker: Ticker,
}

impl FundamentalsRequest {
    pub fn new(ticker: Ticker) -> Self {
        Self { ticker }
    }
}

/// Source of point-in-time company fundamentals.
///
/// Implementations must be `Send + Sync`; one valuation performs at most one
/// [`fundamentals`](FundamentalsProvider::fundamentals) call and never retries it.
pub trait FundamentalsProvider: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the fundamentals snapshot for one ticker.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the upstream is unreachable, rate limited, does not
    /// know the ticker, or returns a payload that cannot be parsed.
    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> ProviderFuture<'a, Result<FundamentalSnapshot, SourceError>>;

    /// Returns the current health status of this provider.
    fn health<'a>(&'a self) -> ProviderFuture<'a, HealthStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_kind() {
        let ticker = Ticker::parse("ACME").expect("valid ticker");
        assert_eq!(SourceError::unavailable("down").code(), "source.unavailable");
        assert_eq!(SourceError::rate_limited("429").code(), "source.rate_limited");
        assert_eq!(SourceError::not_found(&ticker).code(), "source.not_found");
        assert!(SourceError::unavailable("down").retryable());
        assert!(!SourceError::internal("bad json").retryable());
    }

    #[test]
    fn display_includes_message_and_code() {
        let error = SourceError::invalid_request("ticker is required");
        assert_eq!(
            error.to_string(),
            "ticker is required (source.invalid_request)"
        );
    }
}
