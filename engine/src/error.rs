use chrono::{DateTime, Utc};
use shared::BarDefect;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    // Transport, HTTP status or body decoding failures from a bar source.
    #[error("Market data fetch failed for '{symbol}': {reason}")]
    Fetch { symbol: String, reason: String },

    // The provider answered but reported an error (unknown ticker and the like).
    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Malformed bar at {timestamp}: {defect}")]
    MalformedBar {
        timestamp: DateTime<Utc>,
        defect: BarDefect,
    },

    #[error("Chart rendering error: {0}")]
    RenderError(String),
}

impl EngineError {
    /// True when the failure came from the data source rather than from
    /// classification, rendering or local I/O.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            EngineError::Fetch { .. } | EngineError::MarketDataError(_)
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fetch_failures_are_classified() {
        let fetch = EngineError::Fetch { symbol: "INFY.NS".to_string(), reason: "HTTP 503".to_string() };
        assert!(fetch.is_fetch_failure());
        assert!(fetch.to_string().contains("INFY.NS"));
        assert!(EngineError::MarketDataError("No data found".to_string()).is_fetch_failure());
        assert!(!EngineError::ConfigError("bad".to_string()).is_fetch_failure());
    }

    #[test]
    fn test_malformed_bar_message_names_defect() {
        let err = EngineError::MalformedBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            defect: BarDefect::InvertedRange,
        };
        let msg = err.to_string();
        assert!(msg.contains("2024-01-02"));
        assert!(msg.contains("high is below low"));
    }
}
