use intrinsic_core::valuation::{DiscountRate, RateBounds};
use intrinsic_core::{Ticker, ValuationService};
use serde::Serialize;

use crate::cli::DiscountArgs;
use crate::error::CliError;

use super::{fetch_errors, fetch_warnings, parse_ticker, CommandResult};

#[derive(Debug, Serialize)]
struct DiscountResponseData {
    ticker: Ticker,
    discount: DiscountRate,
    effective_rate: f64,
    override_bounds: RateBounds,
    terminal_growth_rate: f64,
}

pub async fn run(
    args: &DiscountArgs,
    service: &ValuationService,
) -> Result<CommandResult, CliError> {
    let ticker = parse_ticker(&args.ticker)?;
    let config = service.engine().config();
    service
        .check_override(args.discount_rate)
        .map_err(|error| CliError::Command(error.to_string()))?;

    let fetched = service.fetch(&ticker).await;
    let discount = service
        .engine()
        .discount_rate(&fetched.snapshot, args.discount_rate)?;

    let warnings = fetch_warnings(&fetched, service);
    let errors = fetch_errors(&fetched);
    let data = serde_json::to_value(DiscountResponseData {
        ticker,
        effective_rate: discount.effective(),
        discount,
        override_bounds: config.discount_rate_bounds(),
        terminal_growth_rate: config.terminal_growth_rate(),
    })?;

    Ok(CommandResult::ok(data, fetched.source)
        .with_errors(errors)
        .with_warnings(warnings)
        .with_latency(fetched.latency_ms))
}
