use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One trading session of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar falls outside the OHLC contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarDefect {
    NonFinite,
    InvertedRange,
    OpenOutsideRange,
    CloseOutsideRange,
}

impl fmt::Display for BarDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BarDefect::NonFinite => "non-finite price",
            BarDefect::InvertedRange => "high is below low",
            BarDefect::OpenOutsideRange => "open outside the high-low range",
            BarDefect::CloseOutsideRange => "close outside the high-low range",
        };
        f.write_str(text)
    }
}

impl Bar {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.open > self.close
    }

    /// Returns the first defect found, checking finiteness before ordering.
    /// Only prices are checked; volume plays no part in classification.
    pub fn validate(&self) -> Result<(), BarDefect> {
        let values = [self.open, self.high, self.low, self.close];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BarDefect::NonFinite);
        }
        if self.high < self.low {
            return Err(BarDefect::InvertedRange);
        }
        if self.open < self.low || self.open > self.high {
            return Err(BarDefect::OpenOutsideRange);
        }
        if self.close < self.low || self.close > self.high {
            return Err(BarDefect::CloseOutsideRange);
        }
        Ok(())
    }
}

/// Bars of one symbol, ascending by timestamp with no duplicate sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBarSeries")]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

// Deserialized form, normalized through `BarSeries::new`.
#[derive(Deserialize)]
struct RawBarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl From<RawBarSeries> for BarSeries {
    fn from(raw: RawBarSeries) -> Self {
        BarSeries::new(raw.symbol, raw.bars)
    }
}

impl BarSeries {
    /// Sorts the bars and keeps the first bar seen for each timestamp.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Keeps only the bars matching `keep`; ordering is preserved.
    pub fn retain(mut self, keep: impl FnMut(&Bar) -> bool) -> Self {
        self.bars.retain(keep);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Buy,
    Sell,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Buy => f.write_str("buy"),
            Polarity::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub polarity: Polarity,
}

/// Markers keyed by session. A session holds at most one marker, so the buy
/// and sell projections never share a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    markers: BTreeMap<DateTime<Utc>, Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a marker. A later marker for the same session replaces the
    /// earlier one.
    pub fn insert(&mut self, marker: Marker) {
        self.markers.insert(marker.timestamp, marker);
    }

    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<&Marker> {
        self.markers.get(timestamp)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn buys(&self) -> BTreeMap<DateTime<Utc>, f64> {
        self.prices_for(Polarity::Buy)
    }

    pub fn sells(&self) -> BTreeMap<DateTime<Utc>, f64> {
        self.prices_for(Polarity::Sell)
    }

    fn prices_for(&self, polarity: Polarity) -> BTreeMap<DateTime<Utc>, f64> {
        self.markers
            .values()
            .filter(|m| m.polarity == polarity)
            .map(|m| (m.timestamp, m.price))
            .collect()
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        let mut set = MarkerSet::new();
        for marker in iter {
            set.insert(marker);
        }
        set
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PercentageError {
    #[error("percentage must be a finite number, got {0}")]
    NotFinite(f64),
    #[error("percentage must be in (0, 100], got {0}")]
    OutOfRange(f64),
}

/// A threshold percentage in `(0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    pub fn new(value: f64) -> Result<Self, PercentageError> {
        if !value.is_finite() {
            return Err(PercentageError::NotFinite(value));
        }
        if value <= 0.0 || value > 100.0 {
            return Err(PercentageError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Percentage {
    type Error = PercentageError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Percentage::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub bullish: Percentage,
    pub bearish: Percentage,
}

impl Thresholds {
    pub fn new(bullish: Percentage, bearish: Percentage) -> Self {
        Self { bullish, bearish }
    }
}
