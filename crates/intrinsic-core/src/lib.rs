//! Core of the `intrinsic` valuation toolkit.
//!
//! This crate contains:
//! - Canonical domain models and validation (`Ticker`, `FundamentalSnapshot`)
//! - The fundamentals provider contract and its Yahoo and static adapters
//! - The multi-stage DCF valuation engine and service
//! - The response envelope and structured errors

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod source;
pub mod valuation;

pub use adapters::{StaticSource, YahooAdapter};
pub use data_source::{
    FundamentalsProvider, FundamentalsRequest, HealthState, HealthStatus, ProviderFuture,
    SourceError, SourceErrorKind,
};
pub use domain::{FundamentalSnapshot, Ticker, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use source::ProviderId;
pub use valuation::{
    ValuationConfig, ValuationEngine, ValuationError, ValuationMethod, ValuationResult,
    ValuationService,
};
