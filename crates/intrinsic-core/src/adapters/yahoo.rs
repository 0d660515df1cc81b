use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::data_source::{
    FundamentalsProvider, FundamentalsRequest, HealthStatus, ProviderFuture, SourceError,
};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient, DEFAULT_TIMEOUT_MS};
use crate::{FundamentalSnapshot, ProviderId, Ticker, UtcDateTime};

const REFERER: &str = "https://finance.yahoo.com/";
const SESSION_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "defaultKeyStatistics,financialData,summaryDetail,\
balanceSheetHistoryQuarterly,cashflowStatementHistory";
const SESSION_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// Session: cookie + crumb handshake
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Caches the crumb token Yahoo requires on `quoteSummary` calls.
///
/// The session cookie itself lives in the transport's cookie jar (or in the
/// `YAHOO_COOKIE` override); only the crumb is held here.
#[derive(Debug, Default)]
struct YahooSession {
    crumb: Mutex<Option<Crumb>>,
}

impl YahooSession {
    fn cached(&self) -> Option<String> {
        let guard = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < SESSION_TTL)
            .map(|crumb| crumb.value.clone())
    }

    fn store(&self, value: String) {
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = Some(Crumb {
            value,
            fetched_at: Instant::now(),
        });
    }

    fn invalidate(&self) {
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn crumb(
        &self,
        http_client: &Arc<dyn HttpClient>,
        auth: &HttpAuth,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        if matches!(auth, HttpAuth::None) {
            let request = HttpRequest::get(SESSION_URL)
                .with_header("referer", REFERER)
                .with_timeout_ms(timeout_ms);
            // fc.yahoo.com answers 404 while still setting the cookie; only transport
            // failures matter here.
            http_client.execute(request).await.map_err(|error| {
                SourceError::unavailable(format!(
                    "failed to open yahoo session: {}",
                    error.message()
                ))
            })?;
        }

        for url in CRUMB_URLS {
            let request = HttpRequest::get(url)
                .with_header("referer", REFERER)
                .with_auth(auth)
                .with_timeout_ms(timeout_ms);

            let Ok(response) = http_client.execute(request).await else {
                continue;
            };
            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited the crumb request",
                ));
            }
            if !response.is_success() {
                continue;
            }

            let body = response.body.trim();
            let looks_like_crumb = !body.is_empty()
                && body.len() < 100
                && !body.contains(char::is_whitespace)
                && !body.contains('<');
            if looks_like_crumb {
                debug!("yahoo session crumb refreshed");
                self.store(body.to_owned());
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Yahoo Finance fundamentals adapter.
///
/// With an offline transport (the default) the adapter serves deterministic synthetic
/// fundamentals derived from the ticker, which keeps the CLI and tests usable without
/// network access.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    timeout_ms: u64,
    session: Arc<YahooSession>,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            auth: HttpAuth::None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session: Arc::new(YahooSession::default()),
        }
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, auth: HttpAuth) -> Self {
        Self {
            http_client,
            auth,
            ..Self::default()
        }
    }

    /// Real transport, honoring a `YAHOO_COOKIE` session override when set.
    pub fn from_env(http_client: Arc<dyn HttpClient>) -> Self {
        let auth = std::env::var("YAHOO_COOKIE")
            .ok()
            .filter(|cookie| !cookie.trim().is_empty())
            .map(HttpAuth::Cookie)
            .unwrap_or(HttpAuth::None);
        Self::with_http_client(http_client, auth)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.http_client.is_offline()
    }

    async fn fetch_summary(&self, ticker: &Ticker) -> Result<FundamentalSnapshot, SourceError> {
        let crumb = self
            .session
            .crumb(&self.http_client, &self.auth, self.timeout_ms)
            .await?;

        let endpoint = format!(
            "{SUMMARY_URL}/{}?modules={}&crumb={}",
            urlencoding::encode(ticker.as_str()),
            urlencoding::encode(SUMMARY_MODULES),
            urlencoding::encode(&crumb)
        );
        let request = HttpRequest::get(endpoint)
            .with_header("referer", REFERER)
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                SourceError::unavailable(format!("yahoo request timed out: {}", error.message()))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            }
        })?;

        match response.status {
            401 | 403 => {
                // Stale crumb. The next call performs a fresh handshake.
                self.session.invalidate();
                Err(SourceError::unavailable(format!(
                    "yahoo rejected the session (status {})",
                    response.status
                )))
            }
            404 => Err(SourceError::not_found(ticker)),
            429 => Err(SourceError::rate_limited("yahoo returned status 429")),
            _ if !response.is_success() => Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            ))),
            _ => parse_summary_response(ticker, &response.body),
        }
    }
}

impl FundamentalsProvider for YahooAdapter {
    /// Offline adapters report [`ProviderId::Mock`] so synthetic data is never labelled Yahoo.
    fn id(&self) -> ProviderId {
        if self.is_offline() {
            ProviderId::Mock
        } else {
            ProviderId::Yahoo
        }
    }

    fn fundamentals<'a>(
        &'a self,
        req: FundamentalsRequest,
    ) -> ProviderFuture<'a, Result<FundamentalSnapshot, SourceError>> {
        Box::pin(async move {
            if self.is_offline() {
                return Ok(synthetic_snapshot(&req.ticker));
            }
            self.fetch_summary(&req.ticker).await
        })
    }

    fn health<'a>(&'a self) -> ProviderFuture<'a, HealthStatus> {
        Box::pin(async move { HealthStatus::healthy() })
    }
}

// ============================================================================
// quoteSummary payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummary,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteSummary {
    #[serde(default)]
    result: Option<Vec<YahooSummaryResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResult {
    #[serde(default)]
    default_key_statistics: Option<YahooKeyStatistics>,
    #[serde(default)]
    financial_data: Option<YahooFinancialData>,
    #[serde(default)]
    summary_detail: Option<YahooSummaryDetail>,
    #[serde(default)]
    balance_sheet_history_quarterly: Option<YahooBalanceSheetHistory>,
    #[serde(default)]
    cashflow_statement_history: Option<YahooCashflowHistory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooKeyStatistics {
    #[serde(default)]
    trailing_eps: Option<YahooRawValue>,
    #[serde(default)]
    shares_outstanding: Option<YahooRawValue>,
    #[serde(default)]
    beta: Option<YahooRawValue>,
    #[serde(default)]
    earnings_quarterly_growth: Option<YahooRawValue>,
    #[serde(default)]
    net_income_to_common: Option<YahooRawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooFinancialData {
    #[serde(default)]
    operating_cashflow: Option<YahooRawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooSummaryDetail {
    #[serde(default)]
    beta: Option<YahooRawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooBalanceSheetHistory {
    #[serde(default)]
    balance_sheet_statements: Vec<YahooBalanceSheet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooBalanceSheet {
    #[serde(default)]
    cash: Option<YahooRawValue>,
    #[serde(default)]
    short_term_investments: Option<YahooRawValue>,
    #[serde(default)]
    short_long_term_debt: Option<YahooRawValue>,
    #[serde(default)]
    long_term_debt: Option<YahooRawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooCashflowHistory {
    #[serde(default)]
    cashflow_statements: Vec<YahooCashflowStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooCashflowStatement {
    #[serde(default)]
    capital_expenditures: Option<YahooRawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; empty objects mean "absent".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: Option<&YahooRawValue>) -> Option<f64> {
    value.and_then(|value| value.raw)
}

fn parse_summary_response(ticker: &Ticker, body: &str) -> Result<FundamentalSnapshot, SourceError> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body).map_err(|error| {
        SourceError::internal(format!("failed to parse yahoo fundamentals: {error}"))
    })?;

    if let Some(error) = response.quote_summary.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(ticker));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo fundamentals API error: {} {}",
            error.code, error.description
        )));
    }

    let Some(result) = response
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Err(SourceError::not_found(ticker));
    };

    let stats = result.default_key_statistics.unwrap_or_default();
    let financials = result.financial_data.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let latest_balance_sheet = result
        .balance_sheet_history_quarterly
        .unwrap_or_default()
        .balance_sheet_statements
        .into_iter()
        .next()
        .unwrap_or_default();
    let latest_cashflow = result
        .cashflow_statement_history
        .unwrap_or_default()
        .cashflow_statements
        .into_iter()
        .next()
        .unwrap_or_default();

    let snapshot = FundamentalSnapshot {
        ticker: ticker.clone(),
        as_of: UtcDateTime::now(),
        eps: raw(stats.trailing_eps.as_ref()),
        operating_cashflow: raw(financials.operating_cashflow.as_ref()),
        shares_outstanding: raw(stats.shares_outstanding.as_ref()),
        beta: raw(detail.beta.as_ref()).or_else(|| raw(stats.beta.as_ref())),
        quarterly_earnings_growth: raw(stats.earnings_quarterly_growth.as_ref()),
        cash: raw(latest_balance_sheet.cash.as_ref()),
        short_term_investments: raw(latest_balance_sheet.short_term_investments.as_ref()),
        short_term_debt: raw(latest_balance_sheet.short_long_term_debt.as_ref()),
        long_term_debt: raw(latest_balance_sheet.long_term_debt.as_ref()),
        net_income_to_common: raw(stats.net_income_to_common.as_ref()),
        capital_expenditures: raw(latest_cashflow.capital_expenditures.as_ref()),
    }
    .normalized();

    if snapshot.is_empty() {
        warn!(ticker = %ticker, "yahoo returned a summary without any usable fundamentals");
    }

    Ok(snapshot)
}

// ============================================================================
// Offline synthetic data
// ============================================================================

fn synthetic_snapshot(ticker: &Ticker) -> FundamentalSnapshot {
    let seed = ticker_seed(ticker);
    FundamentalSnapshot {
        eps: Some(1.0 + (seed % 900) as f64 / 100.0),
        operating_cashflow: Some(2_000_000_000.0 + (seed % 5_000) as f64 * 10_000_000.0),
        shares_outstanding: Some(500_000_000.0 + (seed % 4_000) as f64 * 1_000_000.0),
        beta: Some(0.6 + (seed % 120) as f64 / 100.0),
        // Spans -0.05..0.24 so the default-growth path shows up for some tickers.
        quarterly_earnings_growth: Some((seed % 30) as f64 / 100.0 - 0.05),
        cash: Some(5_000_000_000.0 + (seed % 700) as f64 * 10_000_000.0),
        short_term_investments: Some((seed % 300) as f64 * 10_000_000.0),
        short_term_debt: Some(1_000_000_000.0 + (seed % 200) as f64 * 5_000_000.0),
        long_term_debt: Some(8_000_000_000.0 + (seed % 900) as f64 * 10_000_000.0),
        net_income_to_common: Some(1_500_000_000.0 + (seed % 4_000) as f64 * 5_000_000.0),
        capital_expenditures: Some(-(400_000_000.0 + (seed % 600) as f64 * 1_000_000.0)),
        ..FundamentalSnapshot::empty(ticker.clone())
    }
}

fn ticker_seed(ticker: &Ticker) -> u64 {
    ticker.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}
