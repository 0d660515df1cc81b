use intrinsic_core::valuation::GrowthEstimate;
use intrinsic_core::{Ticker, UtcDateTime, ValuationService};
use serde::Serialize;

use crate::cli::PreviewArgs;
use crate::error::CliError;

use super::{fetch_errors, fetch_warnings, parse_ticker, CommandResult};

/// Fundamentals as the valuation sees them, plus the resolved growth rate.
#[derive(Debug, Serialize)]
struct PreviewResponseData {
    ticker: Ticker,
    as_of: UtcDateTime,
    eps: Option<f64>,
    net_income_to_common: Option<f64>,
    operating_cashflow: Option<f64>,
    capital_expenditures: Option<f64>,
    shares_outstanding: Option<f64>,
    beta: Option<f64>,
    growth: GrowthEstimate,
}

pub async fn run(args: &PreviewArgs, service: &ValuationService) -> Result<CommandResult, CliError> {
    let ticker = parse_ticker(&args.ticker)?;
    let fetched = service.fetch(&ticker).await;

    let warnings = fetch_warnings(&fetched, service);
    let errors = fetch_errors(&fetched);
    let snapshot = &fetched.snapshot;
    let data = serde_json::to_value(PreviewResponseData {
        ticker,
        as_of: snapshot.as_of,
        eps: snapshot.eps,
        net_income_to_common: snapshot.net_income_to_common,
        operating_cashflow: snapshot.operating_cashflow,
        capital_expenditures: snapshot.capital_expenditures,
        shares_outstanding: snapshot.shares_outstanding,
        beta: snapshot.beta,
        growth: service.engine().growth(snapshot),
    })?;

    Ok(CommandResult::ok(data, fetched.source)
        .with_errors(errors)
        .with_warnings(warnings)
        .with_latency(fetched.latency_ms))
}
