// Services composing data sources, signal strategies and chart rendering.
pub mod signal_pipeline;

pub use signal_pipeline::{ChartOutcome, ChartRequest, SignalPipeline, SignalSummary};
