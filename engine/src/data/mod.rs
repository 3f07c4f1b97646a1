//! Market-data sources.
//!
//! A [`BarSource`] turns a ticker symbol and a lookback period in calendar
//! days into a [`BarSeries`] of daily bars. The series is ascending by date;
//! a ticker or period without data yields an empty series, not an error.
//! Transport and provider failures surface as
//! [`EngineError::Fetch`](crate::error::EngineError::Fetch) or
//! [`EngineError::MarketDataError`](crate::error::EngineError::MarketDataError).

pub mod csv_parser;
pub mod yahoo;

use async_trait::async_trait;
use shared::models::BarSeries;

use crate::error::EngineError;

pub use csv_parser::CsvFileSource;
pub use yahoo::YahooChartSource;

#[async_trait]
pub trait BarSource: Send + Sync {
    /// Short identifier used in logs, e.g. `"yahoo"`.
    fn name(&self) -> &str;

    async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<BarSeries, EngineError>;
}
