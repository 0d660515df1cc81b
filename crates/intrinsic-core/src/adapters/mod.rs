//! Fundamentals provider implementations.

pub mod static_source;
pub mod yahoo;

pub use static_source::StaticSource;
pub use yahoo::YahooAdapter;
