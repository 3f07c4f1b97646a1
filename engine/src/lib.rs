// Engine library root: market data, signal classification and chart rendering.

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod services;
pub mod signals;

pub use error::{EngineError, Result};
