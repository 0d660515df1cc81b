//! CLI argument definitions for `intrinsic`.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `value` | Estimate intrinsic value with the EPS and/or OCF method |
//! | `discount` | Show how the discount rate is derived |
//! | `preview` | Show the fundamentals a valuation would use |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--source` | `mock` | Fundamentals provider (mock, yahoo, file) |
//! | `--snapshot` | | JSON snapshot file for `--source file` |
//! | `--timeout-ms` | `3000` | Request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! intrinsic value AAPL --method both --pretty
//! intrinsic value MSFT --discount-rate 0.09 --source yahoo
//! intrinsic --source file --snapshot fundamentals.json preview ACME --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use intrinsic_core::ValuationMethod;

/// Multi-stage discounted cash flow valuation from public fundamentals.
#[derive(Debug, Parser)]
#[command(name = "intrinsic", author, version, about)]
pub struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Where fundamentals come from.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Mock)]
    pub source: SourceSelector,

    /// JSON snapshot file read by `--source file`.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 3000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Deterministic synthetic fundamentals, no network.
    Mock,
    /// Yahoo Finance quoteSummary.
    Yahoo,
    /// Snapshot file given with `--snapshot`.
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodSelector {
    /// Earnings per share, aggregate result with capped terminal value.
    Eps,
    /// Operating cash flow, per-share result adjusted for cash and debt.
    Ocf,
    Both,
}

impl MethodSelector {
    pub fn methods(self) -> Vec<ValuationMethod> {
        match self {
            Self::Eps => vec![ValuationMethod::EpsBased],
            Self::Ocf => vec![ValuationMethod::OcfBased],
            Self::Both => ValuationMethod::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate intrinsic value.
    Value(ValueArgs),
    /// Show discount rate inputs and the rate a valuation would use.
    Discount(DiscountArgs),
    /// Show the fundamentals behind a valuation.
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ValueArgs {
    pub ticker: String,

    #[arg(long, value_enum, default_value_t = MethodSelector::Ocf)]
    pub method: MethodSelector,

    /// Overrides the CAPM rate; must lie within [0.03, 0.15].
    #[arg(long)]
    pub discount_rate: Option<f64>,
}

#[derive(Debug, Args)]
pub struct DiscountArgs {
    pub ticker: String,

    #[arg(long)]
    pub discount_rate: Option<f64>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    pub ticker: String,
}
