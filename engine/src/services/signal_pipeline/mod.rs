// Fetch, window, classify and render one ticker's chart.
mod request;
pub mod sanitize;

use std::sync::Arc;

use crate::chart::ChartComposer;
use crate::config::settings::MalformedBarPolicy;
use crate::data::BarSource;
use crate::error::EngineError;
use crate::signals::{BodyPercentage, SignalStrategy, SignalWindow};

pub use request::{ChartOutcome, ChartRequest, SignalRow, SignalSummary};

pub struct SignalPipeline {
    source: Arc<dyn BarSource>,
    composer: ChartComposer,
    malformed_bars: MalformedBarPolicy,
}

impl SignalPipeline {
    pub fn new(source: Arc<dyn BarSource>, composer: ChartComposer, malformed_bars: MalformedBarPolicy) -> Self {
        SignalPipeline {
            source,
            composer,
            malformed_bars,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Runs one request end to end. A fetch failure aborts before anything
    /// is classified or drawn; an empty series still yields a "No data" chart.
    pub async fn generate_chart(&self, request: &ChartRequest) -> Result<ChartOutcome, EngineError> {
        tracing::info!(
            symbol = %request.symbol,
            source = %self.source.name(),
            candles = request.candle_count,
            lookback_days = request.lookback_days,
            bullish = %request.thresholds.bullish,
            bearish = %request.thresholds.bearish,
            "Generating signal chart"
        );

        let series = self
            .source
            .fetch_bars(&request.symbol, request.lookback_days)
            .await
            .map_err(|e| {
                tracing::error!(symbol = %request.symbol, error = %e, "Failed to fetch bars");
                e
            })?;

        let (series, skipped_bars) = sanitize::apply_policy(series, self.malformed_bars, request.candle_count)?;
        if series.is_empty() {
            tracing::warn!(symbol = %request.symbol, lookback_days = request.lookback_days, "No bars in lookback period");
        }

        let window = SignalWindow::trailing(&series, request.candle_count);
        if window.len() < request.candle_count {
            tracing::debug!(
                symbol = %request.symbol,
                requested = request.candle_count,
                available = window.len(),
                "Window clamped to available bars"
            );
        }

        let strategy = BodyPercentage::new(request.thresholds);
        let markers = strategy.classify(&window);
        let chart = self.composer.render(&window, &markers, &request.title, &request.y_label)?;

        tracing::info!(
            symbol = %request.symbol,
            strategy = %strategy.name(),
            candles = window.len(),
            buys = markers.buys().len(),
            sells = markers.sells().len(),
            "Signal chart ready"
        );

        Ok(ChartOutcome {
            symbol: request.symbol.clone(),
            strategy: strategy.name().to_string(),
            parameters: strategy.parameters(),
            window: window.bars().to_vec(),
            markers,
            skipped_bars,
            chart,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::{Bar, BarSeries, Percentage, Polarity, Thresholds};

    struct FixedSource {
        bars: Vec<Bar>,
    }

    #[async_trait]
    impl BarSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_bars(&self, symbol: &str, _lookback_days: u32) -> Result<BarSeries, EngineError> {
            Ok(BarSeries::new(symbol, self.bars.clone()))
        }
    }

    fn bar(day: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(day),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn thresholds(bullish: f64, bearish: f64) -> Thresholds {
        Thresholds::new(Percentage::new(bullish).unwrap(), Percentage::new(bearish).unwrap())
    }

    fn pipeline(bars: Vec<Bar>, policy: MalformedBarPolicy) -> SignalPipeline {
        SignalPipeline::new(Arc::new(FixedSource { bars }), ChartComposer::default(), policy)
    }

    #[tokio::test]
    async fn test_generate_chart_classifies_trailing_window() {
        let bars = vec![
            bar(0, 100.0, 110.0, 90.0, 109.0), // outside window
            bar(1, 100.0, 110.0, 90.0, 108.0), // buy, 90%
            bar(2, 100.0, 110.0, 90.0, 91.0),  // sell, 95%
            bar(3, 100.0, 110.0, 90.0, 101.0), // 55%, below threshold
        ];
        let pipeline = pipeline(bars, MalformedBarPolicy::Skip);
        let request = ChartRequest::new("TCS.NS", 3, 30, thresholds(60.0, 60.0));

        let outcome = pipeline.generate_chart(&request).await.unwrap();
        assert_eq!(outcome.window.len(), 3);
        assert_eq!(outcome.markers.len(), 2);

        let summary = outcome.summary();
        assert_eq!(summary.buy_count, 1);
        assert_eq!(summary.sell_count, 1);
        assert_eq!(summary.signals[0].polarity, Polarity::Buy);
        assert!((summary.signals[0].body_pct - 90.0).abs() < 1e-9);
        assert_eq!(summary.signals[1].price, 91.0);
        assert!(outcome.chart.as_svg().contains("TCS.NS Candlestick Chart"));
        assert_eq!(pipeline.source_name(), "fixed");
    }

    #[tokio::test]
    async fn test_empty_series_renders_no_data_chart() {
        let pipeline = pipeline(Vec::new(), MalformedBarPolicy::Skip);
        let request = ChartRequest::new("LT.NS", 10, 100, thresholds(50.0, 50.0));
        let outcome = pipeline.generate_chart(&request).await.unwrap();
        assert!(outcome.window.is_empty());
        assert!(outcome.markers.is_empty());
        assert!(outcome.chart.as_svg().contains("No data"));
        assert!(outcome.summary().first_session.is_none());
    }

    #[tokio::test]
    async fn test_reject_policy_fails_request() {
        let bars = vec![bar(0, 100.0, 110.0, 90.0, 109.0), bar(1, 100.0, 90.0, 110.0, 95.0)];
        let pipeline = pipeline(bars, MalformedBarPolicy::Reject);
        let request = ChartRequest::new("SBIN.NS", 10, 100, thresholds(50.0, 50.0));
        let err = pipeline.generate_chart(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedBar { .. }));
    }
}
