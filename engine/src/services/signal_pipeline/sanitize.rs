// Applies the malformed-bar policy to a fetched series.
use shared::models::BarSeries;

use crate::config::settings::MalformedBarPolicy;
use crate::error::EngineError;
use crate::signals::SignalWindow;

/// Returns the series with malformed bars removed and how many were removed.
/// Under `Reject` the first malformed bar among the trailing `window_len`
/// bars fails the request instead; bars before the window are left alone.
pub fn apply_policy(
    series: BarSeries,
    policy: MalformedBarPolicy,
    window_len: usize,
) -> Result<(BarSeries, usize), EngineError> {
    match policy {
        MalformedBarPolicy::Reject => {
            let window = SignalWindow::trailing(&series, window_len);
            let first_defect = window
                .bars()
                .iter()
                .find_map(|bar| bar.validate().err().map(|defect| (bar.timestamp, defect)));
            if let Some((timestamp, defect)) = first_defect {
                tracing::error!(symbol = %series.symbol(), %timestamp, %defect, "Rejecting window with malformed bar");
                return Err(EngineError::MalformedBar { timestamp, defect });
            }
            Ok((series, 0))
        }
        MalformedBarPolicy::Skip => {
            let defects: Vec<_> = series
                .bars()
                .iter()
                .filter_map(|bar| bar.validate().err().map(|defect| (bar.timestamp, defect)))
                .collect();
            if defects.is_empty() {
                return Ok((series, 0));
            }
            for (timestamp, defect) in &defects {
                tracing::warn!(symbol = %series.symbol(), %timestamp, %defect, "Skipping malformed bar");
            }
            let skipped = defects.len();
            let cleaned = series.retain(|bar| bar.validate().is_ok());
            Ok((cleaned, skipped))
        }
    }
}
