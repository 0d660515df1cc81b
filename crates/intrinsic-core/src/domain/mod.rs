//! Canonical domain types: tickers, timestamps and fundamentals snapshots.

mod snapshot;
mod ticker;
mod timestamp;

pub use snapshot::FundamentalSnapshot;
pub use ticker::Ticker;
pub use timestamp::UtcDateTime;
