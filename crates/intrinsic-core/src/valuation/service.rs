use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use super::config::ValuationConfig;
use super::engine::{ValuationEngine, ValuationMethod, ValuationResult};
use super::error::ValuationError;
use crate::{
    FundamentalSnapshot, FundamentalsProvider, FundamentalsRequest, ProviderId, SourceError,
    Ticker,
};

/// Outcome of the single provider round trip a valuation is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedFundamentals {
    /// Empty when the fetch failed.
    pub snapshot: FundamentalSnapshot,
    pub source: ProviderId,
    pub fetch_error: Option<SourceError>,
    pub latency_ms: u64,
}

impl FetchedFundamentals {
    pub fn is_degraded(&self) -> bool {
        self.fetch_error.is_some()
    }
}

/// Binds a provider to the engine: one fetch, then local arithmetic.
#[derive(Clone)]
pub struct ValuationService {
    provider: Arc<dyn FundamentalsProvider>,
    engine: ValuationEngine,
}

impl ValuationService {
    pub fn new(provider: Arc<dyn FundamentalsProvider>, config: ValuationConfig) -> Self {
        Self {
            provider,
            engine: ValuationEngine::new(config),
        }
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Fetches fundamentals once. A provider failure is recorded and replaced by an empty
    /// snapshot, so every field falls back exactly as if it were absent.
    pub async fn fetch(&self, ticker: &Ticker) -> FetchedFundamentals {
        let started = Instant::now();
        let outcome = self
            .provider
            .fundamentals(FundamentalsRequest::new(ticker.clone()))
            .await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (snapshot, fetch_error) = match outcome {
            Ok(snapshot) => (snapshot, None),
            Err(error) => {
                warn!(
                    symbol = %ticker,
                    provider = self.provider.id().as_str(),
                    code = error.code(),
                    error = %error,
                    "fundamentals fetch failed; treating every field as absent"
                );
                (FundamentalSnapshot::empty(ticker.clone()), Some(error))
            }
        };

        FetchedFundamentals {
            snapshot,
            source: self.provider.id(),
            fetch_error,
            latency_ms,
        }
    }

    /// Values already-fetched fundamentals.
    ///
    /// A required field that is missing only because the fetch failed is reported as
    /// [`ValuationError::Provider`] rather than [`ValuationError::MissingData`].
    pub fn evaluate(
        &self,
        fetched: &FetchedFundamentals,
        method: ValuationMethod,
        override_rate: Option<f64>,
    ) -> Result<ValuationResult, ValuationError> {
        self.engine
            .value(method, &fetched.snapshot, override_rate)
            .map_err(|error| match (error, &fetched.fetch_error) {
                (ValuationError::MissingData { field }, Some(source)) => {
                    ValuationError::Provider {
                        field,
                        source: source.clone(),
                    }
                }
                (error, _) => error,
            })
    }

    /// Validates the override, fetches, and values in one call.
    ///
    /// # Errors
    ///
    /// See [`ValuationEngine::value`] and [`ValuationService::evaluate`]. An invalid
    /// override is rejected before the provider is contacted.
    pub async fn value(
        &self,
        ticker: &Ticker,
        method: ValuationMethod,
        override_rate: Option<f64>,
    ) -> Result<ValuationResult, ValuationError> {
        self.check_override(override_rate)?;
        let fetched = self.fetch(ticker).await;
        self.evaluate(&fetched, method, override_rate)
    }

    /// # Errors
    ///
    /// Returns [`ValuationError::InvalidInput`] when the override is non-finite or out of
    /// bounds.
    pub fn check_override(&self, override_rate: Option<f64>) -> Result<(), ValuationError> {
        if let Some(rate) = override_rate {
            self.engine.config().discount_rate_bounds().check(rate)?;
        }
        Ok(())
    }
}
