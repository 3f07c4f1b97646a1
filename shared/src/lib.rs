pub mod models;
pub mod utils;

pub use models::{
    Bar, BarDefect, BarSeries, Marker, MarkerSet, Percentage, PercentageError, Polarity,
    Thresholds,
};
