// Color palettes for the rendered chart.
use engine::chart::ChartStyle;
use serde::{Deserialize, Serialize};

use super::ChartGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub background: String,
    pub foreground: String,
    pub grid: String,
    pub chart_bullish: String,
    pub chart_bearish: String,
    pub buy_marker: String,
    pub sell_marker: String,
}

impl ThemePalette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::default_light(),
            Theme::Dark => Self::default_dark(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1e1e1e".to_string(),
            foreground: "#d1d4dc".to_string(),
            grid: "#363a45".to_string(),
            chart_bullish: "#26a69a".to_string(),
            chart_bearish: "#ef5350".to_string(),
            buy_marker: "#1f77b4".to_string(),
            sell_marker: "#ff7f0e".to_string(),
        }
    }

    // White background with dark green / dark red candles.
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            foreground: "#222222".to_string(),
            grid: "#e0e0e0".to_string(),
            chart_bullish: "#006340".to_string(),
            chart_bearish: "#a02128".to_string(),
            buy_marker: "#1f77b4".to_string(),
            sell_marker: "#ff7f0e".to_string(),
        }
    }

    pub fn chart_style(&self, geometry: &ChartGeometry) -> ChartStyle {
        ChartStyle {
            width: geometry.width,
            height: geometry.height,
            background: self.background.clone(),
            foreground: self.foreground.clone(),
            grid: self.grid.clone(),
            bullish_color: self.chart_bullish.clone(),
            bearish_color: self.chart_bearish.clone(),
            buy_marker_color: self.buy_marker.clone(),
            sell_marker_color: self.sell_marker.clone(),
            marker_size: geometry.marker_size,
            volume_ratio: geometry.volume_ratio,
        }
    }
}
