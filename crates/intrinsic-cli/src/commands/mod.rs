mod discount;
mod preview;
mod value;

use std::sync::Arc;

use intrinsic_core::valuation::{BetaSource, DiscountRate, FetchedFundamentals, GrowthProvenance};
use intrinsic_core::{
    Envelope, EnvelopeError, EnvelopeMeta, FundamentalsProvider, ProviderId, ReqwestHttpClient,
    StaticSource, Ticker, ValuationConfig, ValuationService, YahooAdapter, SCHEMA_VERSION,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub source: ProviderId,
}

impl CommandResult {
    pub fn ok(data: Value, source: ProviderId) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            source,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let service = ValuationService::new(provider(cli)?, ValuationConfig::from_env());

    let command_result = match &cli.command {
        Command::Value(args) => value::run(args, &service).await?,
        Command::Discount(args) => discount::run(args, &service).await?,
        Command::Preview(args) => preview::run(args, &service).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        source,
    } = command_result;

    let request_id = Uuid::new_v4().hyphenated().to_string();
    debug!(
        request_id = %request_id,
        source = %source,
        latency_ms,
        warnings = warnings.len(),
        errors = errors.len(),
        "command complete"
    );
    let mut meta = EnvelopeMeta::new(request_id, SCHEMA_VERSION, source, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn provider(cli: &Cli) -> Result<Arc<dyn FundamentalsProvider>, CliError> {
    let provider: Arc<dyn FundamentalsProvider> = match cli.source {
        SourceSelector::Mock => Arc::new(YahooAdapter::default()),
        SourceSelector::Yahoo => Arc::new(
            YahooAdapter::from_env(Arc::new(ReqwestHttpClient::new()))
                .with_timeout_ms(cli.timeout_ms),
        ),
        SourceSelector::File => {
            let path = cli.snapshot.as_ref().ok_or_else(|| {
                CliError::Command(String::from("--snapshot <PATH> is required with --source file"))
            })?;
            Arc::new(StaticSource::from_json_file(path)?)
        }
    };
    Ok(provider)
}

fn parse_ticker(raw: &str) -> Result<Ticker, CliError> {
    Ticker::parse(raw).map_err(CliError::from)
}

/// A failed fetch is an envelope error for commands that report fundamentals directly.
fn fetch_errors(fetched: &FetchedFundamentals) -> Vec<EnvelopeError> {
    fetched.fetch_error.iter().map(EnvelopeError::from).collect()
}

/// Envelope warnings for a fetch outcome: synthetic data, provider failure and defaulted
/// inputs.
fn fetch_warnings(fetched: &FetchedFundamentals, service: &ValuationService) -> Vec<String> {
    let mut warnings = Vec::new();
    if fetched.source == ProviderId::Mock {
        warnings.push(String::from(
            "mock source serves synthetic offline fundamentals, not market data",
        ));
    }
    if let Some(error) = &fetched.fetch_error {
        warnings.push(format!(
            "{} fetch failed, all fundamentals treated as absent: {error}",
            fetched.source
        ));
    }

    let engine = service.engine();
    let growth = engine.growth(&fetched.snapshot);
    if growth.provenance == GrowthProvenance::Default {
        warnings.push(format!(
            "quarterly earnings growth unavailable, using default {}",
            growth.rate
        ));
    }

    let discount = DiscountRate::derive(engine.config(), fetched.snapshot.beta);
    if discount.beta_source == BetaSource::Default {
        warnings.push(format!("beta unavailable, using default {}", discount.beta));
    }
    warnings
}
