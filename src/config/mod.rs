// Front-end configuration, mirroring assets/config/default.json.
pub mod theme;

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::cli::{Slider, CANDLES, DAYS, THRESHOLD};
pub use theme::{Theme, ThemePalette};

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub version: String,
    pub app: AppSettings,
    pub chart: ChartGeometry,
    pub defaults: SliderDefaults,
    pub stocks: Vec<StockEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub name: String,
    pub theme: Theme,
    /// Shown on the price axis as `Price (<currency>)`.
    pub currency: String,
    pub output: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChartGeometry {
    pub width: u32,
    pub height: u32,
    pub volume_ratio: f64,
    pub marker_size: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SliderDefaults {
    pub candles: u32,
    pub days: u32,
    pub bullish: u32,
    pub bearish: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StockEntry {
    pub name: String,
    pub ticker: String,
}

impl AppConfig {
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let config_str = include_str!("../../assets/config/default.json");
        Self::from_json(config_str)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&config_str)
    }

    pub fn from_json(config_str: &str) -> Result<Self, ConfigLoadError> {
        let config: AppConfig = serde_json::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.stocks.is_empty() {
            return Err(ConfigLoadError::Invalid("stock catalogue is empty".to_string()));
        }
        let check = |slider: &Slider, value: u32| slider.check(value).map_err(ConfigLoadError::Invalid);
        check(&CANDLES, self.defaults.candles)?;
        check(&DAYS, self.defaults.days)?;
        check(&THRESHOLD, self.defaults.bullish)?;
        check(&THRESHOLD, self.defaults.bearish)?;
        Ok(())
    }

    /// Looks a stock up by display name or ticker, ignoring case.
    pub fn find_stock(&self, query: &str) -> Option<&StockEntry> {
        let query = query.trim();
        self.stocks
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(query) || s.ticker.eq_ignore_ascii_case(query))
    }

    pub fn y_label(&self) -> String {
        format!("Price ({})", self.app.currency)
    }
}
