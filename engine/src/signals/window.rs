// Trailing window over a bar series.
use shared::models::{Bar, BarSeries};

/// The last `min(requested, len)` bars of a series.
#[derive(Debug, Clone, Copy)]
pub struct SignalWindow<'a> {
    symbol: &'a str,
    bars: &'a [Bar],
}

impl<'a> SignalWindow<'a> {
    /// Clamps `requested` to the bars available. A short series is used whole;
    /// an empty series gives an empty window.
    pub fn trailing(series: &'a BarSeries, requested: usize) -> Self {
        let bars = series.bars();
        let len = requested.min(bars.len());
        Self {
            symbol: series.symbol(),
            bars: &bars[bars.len() - len..],
        }
    }

    pub fn symbol(&self) -> &'a str {
        self.symbol
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series_of(n: usize) -> BarSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                Bar { timestamp: start + Duration::days(i as i64), open: p, high: p + 1.0, low: p - 1.0, close: p, volume: 10.0 }
            })
            .collect();
        BarSeries::new("LT.NS", bars)
    }

    #[test]
    fn test_window_takes_trailing_bars() {
        let series = series_of(30);
        let window = SignalWindow::trailing(&series, 10);
        assert_eq!(window.len(), 10);
        assert_eq!(window.bars()[0].open, 120.0);
        assert_eq!(window.bars()[9].open, 129.0);
        assert_eq!(window.symbol(), "LT.NS");
    }

    #[test]
    fn test_window_clamps_to_short_series() {
        let series = series_of(7);
        let window = SignalWindow::trailing(&series, 20);
        assert_eq!(window.len(), 7);
        assert_eq!(window.bars(), series.bars());
    }

    #[test]
    fn test_window_empty_series() {
        let series = BarSeries::empty("LT.NS");
        let window = SignalWindow::trailing(&series, 10);
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_zero_requested() {
        let series = series_of(5);
        assert!(SignalWindow::trailing(&series, 0).is_empty());
    }
}
