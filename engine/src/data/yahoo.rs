// Yahoo Finance chart API source (`/v8/finance/chart/{symbol}`), daily interval.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::Deserialize;
use shared::models::{Bar, BarSeries};

use super::BarSource;
use crate::config::settings::EngineSettings;
use crate::error::EngineError;

#[derive(Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(settings: &EngineSettings) -> Result<Self, EngineError> {
        let mut headers = header::HeaderMap::new();
        let agent = header::HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| EngineError::ConfigError(format!("Invalid user agent '{}': {}", settings.user_agent, e)))?;
        headers.insert(header::USER_AGENT, agent);

        let client = Client::builder()
            .timeout(settings.http_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| EngineError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.yahoo_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize, Debug)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartError {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown chart error".to_string(),
        }
    }
}

/// Turns a chart API body into a series. Sessions with any missing OHLC value
/// are skipped; a missing volume is read as 0.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<BarSeries, EngineError> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| EngineError::Fetch {
        symbol: symbol.to_string(),
        reason: format!("unreadable chart response: {}", e),
    })?;

    if let Some(err) = response.chart.error {
        return Err(EngineError::MarketDataError(format!("{} ({})", err.message(), symbol)));
    }

    let Some(result) = response.chart.result.and_then(|mut r| r.pop()) else {
        return Ok(BarSeries::empty(symbol));
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(BarSeries::empty(symbol));
    };

    let mut skipped = 0usize;
    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let timestamp: Option<DateTime<Utc>> = DateTime::from_timestamp(ts, 0);
        match (timestamp, field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close)) {
            (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: field(&quote.volume).unwrap_or(0.0),
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(symbol = %symbol, skipped, "Skipped sessions with missing prices");
    }
    Ok(BarSeries::new(symbol, bars))
}

#[async_trait]
impl BarSource for YahooChartSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<BarSeries, EngineError> {
        let fetch_err = |reason: String| EngineError::Fetch {
            symbol: symbol.to_string(),
            reason,
        };
        let range = format!("{}d", lookback_days);

        tracing::debug!(symbol = %symbol, range = %range, "Requesting daily chart");
        let resp = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("range", range.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| fetch_err(e.to_string()))?;

        if !status.is_success() {
            // Unknown tickers come back as 404 with a chart error object.
            return match parse_chart_response(symbol, &body) {
                Err(err @ EngineError::MarketDataError(_)) => Err(err),
                _ => Err(fetch_err(format!("HTTP {}", status))),
            };
        }

        let series = parse_chart_response(symbol, &body)?;
        tracing::info!(symbol = %symbol, bars = series.len(), lookback_days, "Fetched daily bars");
        Ok(series)
    }
}
