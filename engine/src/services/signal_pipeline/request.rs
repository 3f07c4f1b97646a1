// Request and result records for one chart generation.
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use shared::models::{Bar, MarkerSet, Polarity, Thresholds};

use crate::chart::ChartImage;
use crate::signals::body_percentage::{bearish_body_pct, bullish_body_pct};

/// Everything one chart generation needs, fixed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub symbol: String,
    pub candle_count: usize,
    pub lookback_days: u32,
    pub thresholds: Thresholds,
    pub title: String,
    pub y_label: String,
}

impl ChartRequest {
    pub fn new(symbol: impl Into<String>, candle_count: usize, lookback_days: u32, thresholds: Thresholds) -> Self {
        let symbol = symbol.into();
        Self {
            title: format!("{} Candlestick Chart", symbol),
            y_label: "Price".to_string(),
            symbol,
            candle_count,
            lookback_days,
            thresholds,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_y_label(mut self, y_label: impl Into<String>) -> Self {
        self.y_label = y_label.into();
        self
    }
}

/// The classified window and its rendered chart.
#[derive(Debug, Clone)]
pub struct ChartOutcome {
    pub symbol: String,
    pub strategy: String,
    pub parameters: Value,
    pub window: Vec<Bar>,
    pub markers: MarkerSet,
    /// Malformed bars dropped from the fetched series before windowing.
    pub skipped_bars: usize,
    pub chart: ChartImage,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalRow {
    pub date: DateTime<Utc>,
    pub polarity: Polarity,
    pub price: f64,
    pub body_pct: f64,
}

/// Serializable digest of an outcome, without the SVG.
#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub symbol: String,
    pub strategy: String,
    pub parameters: Value,
    pub candles: usize,
    pub skipped_bars: usize,
    pub first_session: Option<DateTime<Utc>>,
    pub last_session: Option<DateTime<Utc>>,
    pub buy_count: usize,
    pub sell_count: usize,
    pub signals: Vec<SignalRow>,
}

impl ChartOutcome {
    pub fn summary(&self) -> SignalSummary {
        let signals: Vec<SignalRow> = self
            .window
            .iter()
            .filter_map(|bar| {
                self.markers.get(&bar.timestamp).map(|marker| SignalRow {
                    date: marker.timestamp,
                    polarity: marker.polarity,
                    price: marker.price,
                    body_pct: match marker.polarity {
                        Polarity::Buy => bullish_body_pct(bar),
                        Polarity::Sell => bearish_body_pct(bar),
                    },
                })
            })
            .collect();

        SignalSummary {
            symbol: self.symbol.clone(),
            strategy: self.strategy.clone(),
            parameters: self.parameters.clone(),
            candles: self.window.len(),
            skipped_bars: self.skipped_bars,
            first_session: self.window.first().map(|b| b.timestamp),
            last_session: self.window.last().map(|b| b.timestamp),
            buy_count: signals.iter().filter(|s| s.polarity == Polarity::Buy).count(),
            sell_count: signals.iter().filter(|s| s.polarity == Polarity::Sell).count(),
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Percentage;

    #[test]
    fn test_request_defaults_title_from_symbol() {
        let thresholds = Thresholds::new(Percentage::new(50.0).unwrap(), Percentage::new(50.0).unwrap());
        let request = ChartRequest::new("HDFCBANK.NS", 10, 100, thresholds).with_y_label("Price (INR)");
        assert_eq!(request.title, "HDFCBANK.NS Candlestick Chart");
        assert_eq!(request.y_label, "Price (INR)");

        let request = request.with_title("HDFC Bank");
        assert_eq!(request.title, "HDFC Bank");
    }
}
