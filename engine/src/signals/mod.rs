// Candle signal strategies
pub mod body_percentage;
pub mod window;

pub use body_percentage::BodyPercentage;
pub use window::SignalWindow;

use serde_json::Value;
use shared::models::MarkerSet;

// Common trait for signal strategies. Implementations are pure: the same
// window always yields the same markers.
pub trait SignalStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this strategy instance
    fn classify(&self, window: &SignalWindow<'_>) -> MarkerSet;
}
