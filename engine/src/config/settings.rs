// Engine settings: data-source endpoint, HTTP behaviour and malformed-bar policy.
// Defaults match the public Yahoo chart API; each field can be overridden from
// the environment.
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::EngineError;

pub const ENV_YAHOO_BASE_URL: &str = "CANDLE_SIGNALS_YAHOO_BASE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CANDLE_SIGNALS_HTTP_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "CANDLE_SIGNALS_USER_AGENT";
pub const ENV_MALFORMED_BARS: &str = "CANDLE_SIGNALS_MALFORMED_BARS";

/// What the pipeline does with a bar that fails `Bar::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedBarPolicy {
    /// Drop the bar before windowing and keep going.
    #[default]
    Skip,
    /// Fail the whole request.
    Reject,
}

impl FromStr for MalformedBarPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MalformedBarPolicy::Skip),
            "reject" | "fail" => Ok(MalformedBarPolicy::Reject),
            other => Err(EngineError::ConfigError(format!(
                "Unknown malformed bar policy '{}'. Use 'skip' or 'reject'.",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub yahoo_base_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub malformed_bars: MalformedBarPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            http_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            malformed_bars: MalformedBarPolicy::Skip,
        }
    }
}

impl EngineSettings {
    /// Defaults overridden by any `CANDLE_SIGNALS_*` variables present in the
    /// process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = EngineSettings::default();

        if let Some(url) = lookup(ENV_YAHOO_BASE_URL) {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                return Err(EngineError::ConfigError(format!("{} must not be empty", ENV_YAHOO_BASE_URL)));
            }
            settings.yahoo_base_url = url;
        }
        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                EngineError::ConfigError(format!("{} must be a whole number of seconds, got '{}': {}", ENV_HTTP_TIMEOUT_SECS, raw, e))
            })?;
            if secs == 0 {
                return Err(EngineError::ConfigError(format!("{} must be greater than 0", ENV_HTTP_TIMEOUT_SECS)));
            }
            settings.http_timeout_secs = secs;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            settings.user_agent = agent;
        }
        if let Some(policy) = lookup(ENV_MALFORMED_BARS) {
            settings.malformed_bars = policy.parse()?;
        }

        Ok(settings)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
