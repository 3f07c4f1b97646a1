// Body-percentage signal: where the close sits inside the session's high-low range.
//
// A bullish bar (close > open) whose close sits at least `bullish`% of the way
// up from the low is a buy. A bearish bar (open > close) whose close sits at
// least `bearish`% of the way down from the high is a sell. Flat bars and
// zero-range bars never signal.
use super::{SignalStrategy, SignalWindow};
use serde_json::Value;
use shared::models::{Bar, Marker, MarkerSet, Polarity, Thresholds};

/// Absolute slack, in percentage points, when comparing against a threshold.
pub const THRESHOLD_TOLERANCE: f64 = 1e-9;

pub struct BodyPercentage {
    name: String,
    thresholds: Thresholds,
}

impl BodyPercentage {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            name: format!(
                "BodyPct({}/{})",
                thresholds.bullish.value(),
                thresholds.bearish.value()
            ),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

/// `(close - low) / range * 100` for a bullish bar, 0 otherwise or when the
/// range is zero.
pub fn bullish_body_pct(bar: &Bar) -> f64 {
    let range = bar.range();
    if bar.is_bullish() && range > 0.0 {
        (bar.close - bar.low) / range * 100.0
    } else {
        0.0
    }
}

/// `(high - close) / range * 100` for a bearish bar, 0 otherwise or when the
/// range is zero.
pub fn bearish_body_pct(bar: &Bar) -> f64 {
    let range = bar.range();
    if bar.is_bearish() && range > 0.0 {
        (bar.high - bar.close) / range * 100.0
    } else {
        0.0
    }
}

fn meets(pct: f64, threshold: f64) -> bool {
    pct >= threshold - THRESHOLD_TOLERANCE
}

/// Classifies a single bar. Malformed bars (NaN, inverted range, open or
/// close outside the range) and zero-range bars yield `None`.
pub fn classify_bar(bar: &Bar, thresholds: &Thresholds) -> Option<Marker> {
    if bar.validate().is_err() || bar.range() == 0.0 {
        return None;
    }

    let polarity = if bar.is_bullish() {
        meets(bullish_body_pct(bar), thresholds.bullish.value()).then_some(Polarity::Buy)
    } else if bar.is_bearish() {
        meets(bearish_body_pct(bar), thresholds.bearish.value()).then_some(Polarity::Sell)
    } else {
        None
    };

    polarity.map(|polarity| Marker {
        timestamp: bar.timestamp,
        price: bar.close,
        polarity,
    })
}

/// Classifies every bar of `bars` independently.
pub fn classify(bars: &[Bar], thresholds: &Thresholds) -> MarkerSet {
    bars.iter()
        .filter_map(|bar| classify_bar(bar, thresholds))
        .collect()
}

impl SignalStrategy for BodyPercentage {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "bullish_threshold": self.thresholds.bullish.value(),
            "bearish_threshold": self.thresholds.bearish.value(),
        })
    }

    fn classify(&self, window: &SignalWindow<'_>) -> MarkerSet {
        classify(window.bars(), &self.thresholds)
    }
}
