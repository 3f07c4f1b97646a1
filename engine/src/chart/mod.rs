// Chart composition: candles, volume panel and signal markers as an SVG document.
pub mod candlestick;
mod scale;

pub use candlestick::ChartComposer;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::EngineError;

/// Colors and geometry for a rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub foreground: String,
    pub grid: String,
    pub bullish_color: String,
    pub bearish_color: String,
    pub buy_marker_color: String,
    pub sell_marker_color: String,
    pub marker_size: f64,
    /// Share of the plot height given to the volume panel, in `[0, 0.5]`.
    pub volume_ratio: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        // 12:6 figure scaled by 1.2 at 80 dpi
        Self {
            width: 1152,
            height: 576,
            background: "#ffffff".to_string(),
            foreground: "#222222".to_string(),
            grid: "#e0e0e0".to_string(),
            bullish_color: "#006340".to_string(),
            bearish_color: "#a02128".to_string(),
            buy_marker_color: "#1f77b4".to_string(),
            sell_marker_color: "#ff7f0e".to_string(),
            marker_size: 12.0,
            volume_ratio: 0.25,
        }
    }
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    svg: String,
    width: u32,
    height: u32,
}

impl ChartImage {
    pub(crate) fn new(svg: String, width: u32, height: u32) -> Self {
        Self { svg, width, height }
    }

    pub fn as_svg(&self) -> &str {
        &self.svg
    }

    pub fn into_svg(self) -> String {
        self.svg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        std::fs::write(path, self.svg.as_bytes())?;
        tracing::info!(path = %path.display(), bytes = self.svg.len(), "Chart written");
        Ok(())
    }
}
