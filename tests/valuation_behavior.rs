//! Behavior tests for the DCF valuation engine and service.
//!
//! Each test states the observable numbers a caller relies on rather than the
//! intermediate arithmetic.

use std::io::Write;
use std::sync::Arc;

use intrinsic_core::valuation::{
    perpetuity_value, BetaSource, GrowthProvenance, RequiredField,
};
use intrinsic_core::{
    FundamentalSnapshot, StaticSource, Ticker, ValuationConfig, ValuationEngine, ValuationError,
    ValuationMethod, ValuationService,
};

const EPSILON: f64 = 1e-9;

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("valid ticker")
}

fn complete_snapshot() -> FundamentalSnapshot {
    FundamentalSnapshot {
        eps: Some(4.0),
        operating_cashflow: Some(100.0),
        shares_outstanding: Some(10.0),
        beta: Some(1.2),
        quarterly_earnings_growth: Some(0.10),
        cash: Some(50.0),
        short_term_investments: Some(10.0),
        short_term_debt: Some(5.0),
        long_term_debt: Some(15.0),
        ..FundamentalSnapshot::empty(ticker("ACME"))
    }
}

fn assert_close(actual: f64, expected: f64, context: &str) {
    assert!(
        (actual - expected).abs() < EPSILON * expected.abs().max(1.0),
        "{context}: expected {expected}, got {actual}"
    );
}

// =============================================================================
// Discount rate
// =============================================================================

#[test]
fn missing_or_non_positive_beta_uses_exactly_one() {
    let engine = ValuationEngine::default();

    for beta in [None, Some(0.0), Some(-0.7)] {
        // Given: fundamentals whose beta is unusable
        let snapshot = FundamentalSnapshot {
            beta,
            ..complete_snapshot()
        };

        // When: the discount rate is derived
        let rate = engine.discount_rate(&snapshot, None).expect("no override");

        // Then: beta is 1.0 and the CAPM rate is 0.045 + 0.025
        assert_eq!(rate.beta, 1.0, "beta input {beta:?}");
        assert_eq!(rate.beta_source, BetaSource::Default);
        assert_close(rate.effective(), 0.07, "derived rate");
    }
}

#[test]
fn caller_override_drives_every_discount_factor() {
    // Given: a provider beta of 1.2 (derived rate 0.075) and an override of 0.09
    let engine = ValuationEngine::default();

    // When: the cash-flow valuation runs with the override
    let result = engine
        .value(ValuationMethod::OcfBased, &complete_snapshot(), Some(0.09))
        .expect("valuation");

    // Then: the derived rate is informational and rows discount at 0.09
    assert_close(result.discount.derived_rate, 0.075, "derived rate");
    assert_eq!(result.discount.effective(), 0.09);
    for row in &result.rows {
        assert_close(
            row.discount_factor,
            1.09_f64.powi(-(row.year as i32)),
            "discount factor",
        );
    }
}

// =============================================================================
// Growth
// =============================================================================

#[test]
fn missing_or_non_positive_growth_defaults_to_ten_percent() {
    let engine = ValuationEngine::default();

    for growth in [None, Some(0.0), Some(-0.25)] {
        let snapshot = FundamentalSnapshot {
            quarterly_earnings_growth: growth,
            ..complete_snapshot()
        };

        let estimate = engine.growth(&snapshot);

        assert_eq!(estimate.rate, 0.10, "growth input {growth:?}");
        assert_eq!(estimate.provenance, GrowthProvenance::Default);
        assert_eq!(estimate.provenance.as_str(), "default");
    }
}

#[test]
fn provider_growth_is_used_as_is() {
    let engine = ValuationEngine::default();
    let snapshot = FundamentalSnapshot {
        quarterly_earnings_growth: Some(0.18),
        ..complete_snapshot()
    };

    let estimate = engine.growth(&snapshot);

    assert_eq!(estimate.rate, 0.18);
    assert_eq!(estimate.provenance.as_str(), "provider");
}

// =============================================================================
// EPS-based method
// =============================================================================

#[test]
fn eps_schedule_has_five_steps_and_terminal_tail() {
    // Given: EPS 4.0 and provider growth of 12%
    let engine = ValuationEngine::default();
    let snapshot = FundamentalSnapshot {
        quarterly_earnings_growth: Some(0.12),
        ..complete_snapshot()
    };

    // When: the EPS valuation runs
    let result = engine
        .value(ValuationMethod::EpsBased, &snapshot, None)
        .expect("valuation");

    // Then: the schedule is [g, g, g/2, g/2, 0.04] and later years reuse 0.04
    assert_eq!(result.schedule.rates(), &[0.12, 0.12, 0.06, 0.06, 0.04]);
    assert_eq!(result.rows.len(), 20);
    let growth: Vec<f64> = result.rows.iter().map(|row| row.growth_rate).collect();
    assert_eq!(&growth[..5], &[0.12, 0.12, 0.06, 0.06, 0.04]);
    assert!(growth[5..].iter().all(|rate| *rate == 0.04));

    // And: each year compounds the base directly at its own rate
    assert_close(result.rows[2].projected_value, 4.0 * 1.06_f64.powi(3), "year 3");
    assert_close(result.rows[19].projected_value, 4.0 * 1.04_f64.powi(20), "year 20");
}

#[test]
fn terminal_value_follows_perpetuity_growth() {
    // Given: discount rate 0.10 and terminal growth 0.04
    let last = 7.5;

    // When: the terminal value is computed directly
    let terminal = perpetuity_value(last, 0.10, 0.04).expect("r > g");

    // Then: it equals V * 1.04 / 0.06
    assert_close(terminal, last * 1.04 / 0.06, "undiscounted terminal");

    // And: the engine uses the last projected value and the year-20 factor
    let result = ValuationEngine::default()
        .value(ValuationMethod::EpsBased, &complete_snapshot(), Some(0.10))
        .expect("valuation");
    let terminal = result.terminal.expect("eps carries a terminal value");
    let last_row = result.rows.last().expect("twenty rows");
    assert_close(
        terminal.undiscounted,
        last_row.projected_value * 1.04 / 0.06,
        "engine terminal",
    );
    assert_close(
        terminal.discounted,
        terminal.undiscounted * 1.10_f64.powi(-20),
        "discounted terminal",
    );
}

#[test]
fn dominant_terminal_value_is_capped_at_sixty_percent_of_result() {
    // Given: a discount rate barely above terminal growth, so the tail dominates
    let engine = ValuationEngine::default();

    // When: the EPS valuation runs at 0.06
    let result = engine
        .value(ValuationMethod::EpsBased, &complete_snapshot(), Some(0.06))
        .expect("valuation");
    let terminal = result.terminal.expect("eps carries a terminal value");
    let sum: f64 = result.discounted_values().iter().sum();

    // Then: the naive share exceeded 60% and was capped
    assert!(terminal.discounted / (sum + terminal.discounted) > 0.6);
    assert!(terminal.capped);

    // And: the capped terminal is exactly 60% of the recomputed intrinsic value
    assert_close(result.unrounded_value, sum + terminal.contribution, "recomputed total");
    assert_close(terminal.contribution, 0.6 * result.unrounded_value, "cap fixed point");
}

#[test]
fn modest_terminal_value_is_not_capped() {
    let result = ValuationEngine::default()
        .value(ValuationMethod::EpsBased, &complete_snapshot(), Some(0.15))
        .expect("valuation");
    let terminal = result.terminal.expect("eps carries a terminal value");
    let sum: f64 = result.discounted_values().iter().sum();

    assert!(!terminal.capped);
    assert_eq!(terminal.contribution, terminal.discounted);
    assert_close(result.unrounded_value, sum + terminal.discounted, "total");
}

#[test]
fn eps_result_is_aggregate_without_balance_sheet_adjustment() {
    let with_cash = complete_snapshot();
    let without_cash = FundamentalSnapshot {
        cash: None,
        long_term_debt: None,
        shares_outstanding: None,
        ..complete_snapshot()
    };
    let engine = ValuationEngine::default();

    let a = engine
        .value(ValuationMethod::EpsBased, &with_cash, None)
        .expect("valuation");
    let b = engine
        .value(ValuationMethod::EpsBased, &without_cash, None)
        .expect("shares are not needed for eps");

    assert!(a.balance_sheet.is_none());
    assert_eq!(a.intrinsic_value, b.intrinsic_value);
}

// =============================================================================
// OCF-based method
// =============================================================================

#[test]
fn ocf_rows_discount_at_the_effective_rate_and_adjust_per_share() {
    // Given: ocf 100, 10 shares, growth 10%, discount rate 0.08,
    //        cash 50 + investments 10, debt 5 + 15
    let engine = ValuationEngine::default();

    // When: the OCF valuation runs
    let result = engine
        .value(ValuationMethod::OcfBased, &complete_snapshot(), Some(0.08))
        .expect("valuation");

    // Then: regimes are 10% for years 1-5, 5% for 6-10 and 4% afterwards
    assert_eq!(result.rows.len(), 20);
    for row in &result.rows {
        let expected_growth = match row.year {
            1..=5 => 0.10,
            6..=10 => 0.05,
            _ => 0.04,
        };
        assert_eq!(row.growth_rate, expected_growth, "year {}", row.year);
        assert_close(
            row.projected_value,
            100.0 * (1.0 + expected_growth).powi(row.year as i32),
            "projected",
        );
        assert_close(
            row.discounted_value,
            row.projected_value * 1.08_f64.powi(-(row.year as i32)),
            "discounted",
        );
    }

    // And: the final figure is per share, plus cash and minus debt per share
    let sum: f64 = result.discounted_values().iter().sum();
    let expected = sum / 10.0 + 60.0 / 10.0 - 20.0 / 10.0;
    assert_close(result.unrounded_value, expected, "per-share value");
    assert_eq!(result.intrinsic_value, (expected * 100.0).round() / 100.0);
    assert!(result.terminal.is_none(), "ocf never adds a terminal value");

    let adjustment = result.balance_sheet.expect("ocf adjusts for cash and debt");
    assert_close(adjustment.cash_per_share, 6.0, "cash per share");
    assert_close(adjustment.debt_per_share, 2.0, "debt per share");
}

#[test]
fn absent_cash_and_debt_count_as_zero() {
    let snapshot = FundamentalSnapshot {
        cash: None,
        short_term_investments: None,
        short_term_debt: None,
        long_term_debt: None,
        ..complete_snapshot()
    };

    let result = ValuationEngine::default()
        .value(ValuationMethod::OcfBased, &snapshot, Some(0.08))
        .expect("valuation");
    let adjustment = result.balance_sheet.expect("ocf adjustment");

    assert_eq!(adjustment.cash_per_share, 0.0);
    assert_eq!(adjustment.debt_per_share, 0.0);
    assert_close(adjustment.final_value, adjustment.intrinsic_per_share, "final");
}

#[test]
fn missing_shares_yield_missing_data_not_a_division() {
    for shares in [None, Some(0.0), Some(-5.0)] {
        // Given: no usable share count
        let snapshot = FundamentalSnapshot {
            shares_outstanding: shares,
            ..complete_snapshot()
        };

        // When: the OCF valuation runs
        let error = ValuationEngine::default()
            .value(ValuationMethod::OcfBased, &snapshot, None)
            .expect_err("shares required");

        // Then: the caller gets a typed missing-data error
        assert_eq!(
            error,
            ValuationError::MissingData {
                field: RequiredField::SharesOutstanding
            },
            "shares input {shares:?}"
        );
    }
}

// =============================================================================
// Domain
// =============================================================================

#[test]
fn discount_rate_equal_to_terminal_growth_is_a_domain_error() {
    let engine = ValuationEngine::default();

    for method in ValuationMethod::ALL {
        let error = engine
            .value(method, &complete_snapshot(), Some(0.04))
            .expect_err("r == g");

        assert!(
            matches!(error, ValuationError::Domain { discount_rate, terminal_growth }
                if discount_rate == 0.04 && terminal_growth == 0.04),
            "{method}: {error:?}"
        );
    }
}

#[test]
fn derived_rate_below_terminal_growth_is_a_domain_error() {
    // Given: a configuration whose CAPM rate lands at 0.03
    let config = ValuationConfig::default()
        .with_risk_free_rate(0.0)
        .with_market_risk_premium(0.03);
    let engine = ValuationEngine::new(config);
    let snapshot = FundamentalSnapshot {
        beta: None,
        ..complete_snapshot()
    };

    // When / Then: the valuation refuses rather than returning a negative tail
    let error = engine
        .value(ValuationMethod::EpsBased, &snapshot, None)
        .expect_err("r < g");
    assert_eq!(error.code(), "valuation.domain");
}

// =============================================================================
// Service
// =============================================================================

#[tokio::test]
async fn snapshot_file_drives_a_full_valuation() {
    // Given: fundamentals stored in a JSON snapshot file
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"ticker":"ACME","operating_cashflow":100.0,"shares_outstanding":10.0,
            "quarterly_earnings_growth":0.10,"cash":50.0,"short_term_investments":10.0,
            "short_term_debt":5.0,"long_term_debt":15.0}}"#
    )
    .expect("write snapshot");
    let source = StaticSource::from_json_file(file.path()).expect("load snapshot");
    let service = ValuationService::new(Arc::new(source), ValuationConfig::default());

    // When: the service values the ticker
    let from_file = service
        .value(&ticker("ACME"), ValuationMethod::OcfBased, Some(0.08))
        .await
        .expect("valuation");

    // Then: the result matches valuing the same fundamentals directly
    let direct = ValuationEngine::default()
        .value(ValuationMethod::OcfBased, &complete_snapshot(), Some(0.08))
        .expect("valuation");
    assert_eq!(from_file.intrinsic_value, direct.intrinsic_value);
}

#[tokio::test]
async fn concurrent_valuations_are_independent() {
    // Given: one service shared by concurrent callers
    let service = ValuationService::new(
        Arc::new(StaticSource::new([
            complete_snapshot(),
            FundamentalSnapshot {
                eps: Some(2.0),
                ..FundamentalSnapshot::empty(ticker("INIT"))
            },
        ])),
        ValuationConfig::default(),
    );

    // When: two different valuations run at the same time
    let acme = ticker("ACME");
    let init = ticker("INIT");
    let (first, second, again) = tokio::join!(
        service.value(&acme, ValuationMethod::EpsBased, None),
        service.value(&init, ValuationMethod::EpsBased, Some(0.12)),
        service.value(&acme, ValuationMethod::EpsBased, None),
    );

    // Then: each result depends only on its own inputs
    let first = first.expect("acme");
    let second = second.expect("init");
    let again = again.expect("acme again");
    assert_eq!(first.intrinsic_value, again.intrinsic_value);
    assert_eq!(second.discount.effective(), 0.12);
    assert_eq!(second.ticker.as_str(), "INIT");
}
