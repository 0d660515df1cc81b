use intrinsic_core::{EnvelopeError, FundamentalSnapshot, ValuationResult, ValuationService};
use serde::Serialize;

use crate::cli::ValueArgs;
use crate::error::CliError;

use super::{fetch_warnings, parse_ticker, CommandResult};

#[derive(Debug, Serialize)]
struct ValueResponseData {
    fundamentals: FundamentalSnapshot,
    valuations: Vec<ValuationResult>,
}

pub async fn run(args: &ValueArgs, service: &ValuationService) -> Result<CommandResult, CliError> {
    let ticker = parse_ticker(&args.ticker)?;
    service
        .check_override(args.discount_rate)
        .map_err(|error| CliError::Command(error.to_string()))?;

    let fetched = service.fetch(&ticker).await;
    let mut valuations = Vec::new();
    let mut errors = Vec::new();
    for method in args.method.methods() {
        match service.evaluate(&fetched, method, args.discount_rate) {
            Ok(result) => valuations.push(result),
            Err(error) => errors.push(EnvelopeError::from(&error)),
        }
    }

    let warnings = fetch_warnings(&fetched, service);
    let data = serde_json::to_value(ValueResponseData {
        fundamentals: fetched.snapshot,
        valuations,
    })?;

    Ok(CommandResult::ok(data, fetched.source)
        .with_errors(errors)
        .with_warnings(warnings)
        .with_latency(fetched.latency_ms))
}
