use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Theme;

/// Bounded integer input with a fixed step, counted from `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    pub name: &'static str,
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

pub const CANDLES: Slider = Slider { name: "candles", min: 5, max: 50, step: 1 };
pub const DAYS: Slider = Slider { name: "days", min: 10, max: 365, step: 10 };
pub const THRESHOLD: Slider = Slider { name: "threshold", min: 10, max: 90, step: 5 };

impl Slider {
    pub fn check(&self, value: u32) -> Result<u32, String> {
        if value < self.min || value > self.max {
            return Err(format!("{} must be between {} and {}, got {}", self.name, self.min, self.max, value));
        }
        if (value - self.min) % self.step != 0 {
            return Err(format!(
                "{} must be {} plus a multiple of {}, got {}",
                self.name, self.min, self.step, value
            ));
        }
        Ok(value)
    }

    fn parse(&self, raw: &str) -> Result<u32, String> {
        let value: u32 = raw
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a whole number, got '{}'", self.name, raw))?;
        self.check(value)
    }
}

fn parse_candles(raw: &str) -> Result<u32, String> {
    CANDLES.parse(raw)
}

fn parse_days(raw: &str) -> Result<u32, String> {
    DAYS.parse(raw)
}

fn parse_threshold(raw: &str) -> Result<u32, String> {
    THRESHOLD.parse(raw)
}

#[derive(Parser, Debug)]
#[command(name = "candle-signals", version, about = "Candlestick charts with body-percentage buy/sell signals")]
pub struct Cli {
    /// Use this JSON app config instead of the built-in one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch bars, classify the trailing window and write the chart
    Chart(ChartArgs),
    /// List the stock catalogue
    Stocks,
    /// About this tool
    About,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Stock from the catalogue, by name or ticker
    #[arg(long, conflicts_with = "ticker", required_unless_present = "ticker")]
    pub stock: Option<String>,

    /// Any ticker symbol, bypassing the catalogue
    #[arg(long)]
    pub ticker: Option<String>,

    /// Number of trailing candles to classify and draw [5-50]
    #[arg(long, value_parser = parse_candles)]
    pub candles: Option<u32>,

    /// Lookback period in calendar days [10-365, step 10]
    #[arg(long, value_parser = parse_days)]
    pub days: Option<u32>,

    /// Bullish body threshold in percent [10-90, step 5]
    #[arg(long, value_parser = parse_threshold)]
    pub bullish: Option<u32>,

    /// Bearish body threshold in percent [10-90, step 5]
    #[arg(long, value_parser = parse_threshold)]
    pub bearish: Option<u32>,

    /// Where to write the SVG chart
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Read bars from a CSV file instead of Yahoo Finance
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Print the signal summary as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_enum)]
    pub theme: Option<Theme>,
}
