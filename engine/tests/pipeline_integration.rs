use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine::chart::ChartComposer;
use engine::config::MalformedBarPolicy;
use engine::data::{BarSource, CsvFileSource};
use engine::error::EngineError;
use engine::services::{ChartRequest, SignalPipeline};
use shared::models::{Bar, BarSeries, Percentage, Polarity, Thresholds};

struct InMemorySource {
    bars: Vec<Bar>,
    calls: AtomicUsize,
}

impl InMemorySource {
    fn new(bars: Vec<Bar>) -> Self {
        Self { bars, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl BarSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_bars(&self, symbol: &str, _lookback_days: u32) -> Result<BarSeries, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BarSeries::new(symbol, self.bars.clone()))
    }
}

struct FailingSource;

#[async_trait]
impl BarSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_bars(&self, symbol: &str, _lookback_days: u32) -> Result<BarSeries, EngineError> {
        Err(EngineError::Fetch {
            symbol: symbol.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

fn bar(day: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(day),
        open,
        high,
        low,
        close,
        volume: 10_000.0 + day as f64,
    }
}

fn thresholds(bullish: f64, bearish: f64) -> Thresholds {
    Thresholds::new(Percentage::new(bullish).unwrap(), Percentage::new(bearish).unwrap())
}

fn count(svg: &str, needle: &str) -> usize {
    svg.matches(needle).count()
}

// Alternating strong up and strong down candles with a doji in the middle.
fn seven_bars() -> Vec<Bar> {
    vec![
        bar(0, 100.0, 112.0, 98.0, 110.0),
        bar(1, 110.0, 112.0, 98.0, 100.0),
        bar(2, 100.0, 112.0, 98.0, 110.0),
        bar(3, 100.0, 105.0, 95.0, 100.0),
        bar(4, 110.0, 112.0, 98.0, 100.0),
        bar(5, 100.0, 112.0, 98.0, 110.0),
        bar(6, 110.0, 112.0, 98.0, 100.0),
    ]
}

#[tokio::test]
async fn test_short_series_is_fully_classified_and_drawn() {
    let source = Arc::new(InMemorySource::new(seven_bars()));
    let pipeline = SignalPipeline::new(source.clone(), ChartComposer::default(), MalformedBarPolicy::Skip);
    let request = ChartRequest::new("RELIANCE.NS", 20, 100, thresholds(70.0, 70.0));

    let outcome = pipeline.generate_chart(&request).await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.window.len(), 7);

    let buys = outcome.markers.buys();
    let sells = outcome.markers.sells();
    assert_eq!(buys.len(), 3);
    assert_eq!(sells.len(), 3);
    assert!(buys.keys().all(|k| !sells.contains_key(k)));
    assert!(buys.values().all(|&price| price == 110.0));
    assert!(sells.values().all(|&price| price == 100.0));

    let svg = outcome.chart.as_svg();
    assert_eq!(count(svg, r#"class="candle-body "#), 7);
    assert_eq!(count(svg, r#"class="marker buy""#), 3);
    assert_eq!(count(svg, r#"class="marker sell""#), 3);
}

#[tokio::test]
async fn test_high_thresholds_suppress_all_markers() {
    let source = Arc::new(InMemorySource::new(seven_bars()));
    let pipeline = SignalPipeline::new(source, ChartComposer::default(), MalformedBarPolicy::Skip);
    let request = ChartRequest::new("RELIANCE.NS", 10, 100, thresholds(90.0, 90.0));

    let outcome = pipeline.generate_chart(&request).await.unwrap();
    assert!(outcome.markers.is_empty());
    assert_eq!(count(outcome.chart.as_svg(), r#"class="marker "#), 0);
}

#[tokio::test]
async fn test_fetch_failure_propagates() {
    let pipeline = SignalPipeline::new(Arc::new(FailingSource), ChartComposer::default(), MalformedBarPolicy::Skip);
    let request = ChartRequest::new("ADANIENT.NS", 10, 100, thresholds(50.0, 50.0));

    let err = pipeline.generate_chart(&request).await.unwrap_err();
    assert!(err.is_fetch_failure());
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_malformed_bars_follow_policy() {
    let mut bars = seven_bars();
    bars.push(bar(7, 100.0, f64::NAN, 98.0, 110.0));

    let skip = SignalPipeline::new(
        Arc::new(InMemorySource::new(bars.clone())),
        ChartComposer::default(),
        MalformedBarPolicy::Skip,
    );
    let request = ChartRequest::new("HINDUNILVR.NS", 3, 100, thresholds(70.0, 70.0));
    let outcome = skip.generate_chart(&request).await.unwrap();
    assert_eq!(outcome.skipped_bars, 1);
    // window shifts back onto the last three valid bars
    assert_eq!(outcome.window.last().map(|b| b.timestamp), Some(bar(6, 0.0, 0.0, 0.0, 0.0).timestamp));
    assert_eq!(outcome.markers.len(), 3);

    let reject = SignalPipeline::new(
        Arc::new(InMemorySource::new(bars)),
        ChartComposer::default(),
        MalformedBarPolicy::Reject,
    );
    let err = reject.generate_chart(&request).await.unwrap_err();
    assert!(matches!(err, EngineError::MalformedBar { .. }));
}

#[tokio::test]
async fn test_csv_source_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2024-06-03,100,112,98,110,110,1000").unwrap();
    writeln!(file, "2024-06-04,110,112,98,100,100,1200").unwrap();
    writeln!(file, "2024-06-05,100,105,95,100,100,900").unwrap();

    let pipeline = SignalPipeline::new(
        Arc::new(CsvFileSource::new(file.path())),
        ChartComposer::default(),
        MalformedBarPolicy::Skip,
    );
    let request = ChartRequest::new("LT.NS", 10, 30, thresholds(70.0, 70.0)).with_y_label("Price (INR)");
    let outcome = pipeline.generate_chart(&request).await.unwrap();

    let summary = outcome.summary();
    assert_eq!(summary.candles, 3);
    assert_eq!(summary.signals.len(), 2);
    assert_eq!(summary.signals[0].polarity, Polarity::Buy);
    assert_eq!(summary.signals[1].polarity, Polarity::Sell);
    assert!(outcome.chart.as_svg().contains("Price (INR)"));

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("lt.svg");
    outcome.chart.write_to(&path).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("</svg>"));
}

#[tokio::test]
async fn test_reject_only_checks_requested_window() {
    let mut bars = vec![bar(0, 100.0, 95.0, 105.0, 101.0)];
    bars.extend((1..60).map(|d| bar(d, 100.0, 112.0, 98.0, 110.0)));

    let pipeline = SignalPipeline::new(
        Arc::new(InMemorySource::new(bars)),
        ChartComposer::default(),
        MalformedBarPolicy::Reject,
    );
    let request = ChartRequest::new("BHARTIARTL.NS", 5, 100, thresholds(50.0, 50.0));
    let outcome = pipeline.generate_chart(&request).await.unwrap();
    assert_eq!(outcome.window.len(), 5);
    assert_eq!(outcome.skipped_bars, 0);
    assert_eq!(outcome.markers.buys().len(), 5);
}
