use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use intrinsic_core::{
    FundamentalSnapshot, FundamentalsProvider, FundamentalsRequest, HealthState, ProviderId,
    SourceError, SourceErrorKind, StaticSource, Ticker, YahooAdapter,
};

struct ProviderCase {
    id: ProviderId,
    source: Arc<dyn FundamentalsProvider>,
    known: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Mock,
            source: Arc::new(YahooAdapter::default()),
            known: "AAPL",
        },
        ProviderCase {
            id: ProviderId::Static,
            source: Arc::new(StaticSource::new([FundamentalSnapshot {
                eps: Some(6.4),
                operating_cashflow: Some(110_000_000_000.0),
                shares_outstanding: Some(15_000_000_000.0),
                beta: Some(1.3),
                ..FundamentalSnapshot::empty(ticker("AAPL"))
            }])),
            known: "AAPL",
        },
    ]
}

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("valid ticker")
}

#[test]
fn providers_report_their_own_id() {
    for case in provider_cases() {
        assert_eq!(case.source.id(), case.id);
    }
}

#[test]
fn fundamentals_echo_the_requested_ticker() {
    for case in provider_cases() {
        let snapshot = block_on(
            case.source
                .fundamentals(FundamentalsRequest::new(ticker(case.known))),
        )
        .unwrap_or_else(|error| panic!("provider '{}' fundamentals failed: {error}", case.id));

        assert_eq!(snapshot.ticker.as_str(), case.known, "provider '{}'", case.id);
        assert!(!snapshot.is_empty(), "provider '{}': snapshot empty", case.id);
    }
}

#[test]
fn every_reported_metric_is_finite() {
    for case in provider_cases() {
        let snapshot = block_on(
            case.source
                .fundamentals(FundamentalsRequest::new(ticker(case.known))),
        )
        .expect("fundamentals");

        let metrics = [
            snapshot.eps,
            snapshot.operating_cashflow,
            snapshot.shares_outstanding,
            snapshot.beta,
            snapshot.quarterly_earnings_growth,
            snapshot.cash,
            snapshot.short_term_investments,
            snapshot.short_term_debt,
            snapshot.long_term_debt,
        ];
        assert!(
            metrics.iter().flatten().all(|value| value.is_finite()),
            "provider '{}': non-finite metric in {snapshot:?}",
            case.id
        );
    }
}

#[test]
fn healthy_providers_report_healthy() {
    for case in provider_cases() {
        let health = block_on(case.source.health());
        assert_eq!(health.state, HealthState::Healthy, "provider '{}'", case.id);
    }
}

#[test]
fn offline_yahoo_is_deterministic_per_ticker() {
    let adapter = YahooAdapter::default();
    assert!(adapter.is_offline());
    assert_eq!(adapter.id(), ProviderId::Mock, "synthetic data is never labelled yahoo");

    let first = block_on(adapter.fundamentals(FundamentalsRequest::new(ticker("MSFT"))))
        .expect("offline fundamentals");
    let second = block_on(adapter.fundamentals(FundamentalsRequest::new(ticker("MSFT"))))
        .expect("offline fundamentals");
    let other = block_on(adapter.fundamentals(FundamentalsRequest::new(ticker("NVDA"))))
        .expect("offline fundamentals");

    assert_eq!(first.eps, second.eps);
    assert_eq!(first.operating_cashflow, second.operating_cashflow);
    assert_ne!(first.eps, other.eps);
}

#[test]
fn static_source_reports_unknown_ticker_as_not_found() {
    let source = StaticSource::new([FundamentalSnapshot::empty(ticker("ACME"))]);

    let error = block_on(source.fundamentals(FundamentalsRequest::new(ticker("ZZZZ"))))
        .expect_err("unknown ticker");

    assert_eq!(error.kind(), SourceErrorKind::NotFound);
    assert_eq!(error.code(), "source.not_found");
    assert!(!error.retryable());
}

#[test]
fn failing_source_is_unhealthy_and_errors_every_fetch() {
    let source = StaticSource::failing(SourceError::unavailable("maintenance window"));

    assert_eq!(block_on(source.health()).state, HealthState::Unhealthy);
    for raw in ["AAPL", "MSFT"] {
        let error = block_on(source.fundamentals(FundamentalsRequest::new(ticker(raw))))
            .expect_err("outage");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: The vtable functions never dereference the data pointer and are no-ops.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop_raw_waker_noop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
    noop_raw_waker_clone,
    noop_raw_waker_noop,
    noop_raw_waker_noop,
    noop_raw_waker_noop,
);
