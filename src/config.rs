use crate::error::{AnalyticsError, Result};
use crate::schema::Source;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_TERMINAL: &str = "SAINT_BI_WEB";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUMMARY_LOOKBACK_DAYS: u32 = 30;
pub const DEFAULT_FORECAST_LOOKBACK_DAYS: u32 = 90;
/// Longest accepted lookback, ten years.
pub const MAX_LOOKBACK_DAYS: u32 = 3660;

pub const ENV_API_KEY: &str = "SAINT_API_KEY";
pub const ENV_API_ID: &str = "SAINT_API_ID";
pub const ENV_TERMINAL: &str = "SAINT_TERMINAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    /// Value of the `x-api-key` login header.
    pub api_key: String,
    /// Value of the `x-api-id` login header.
    pub api_id: String,
    /// Terminal name announced on login.
    pub terminal: String,
    pub request_timeout_secs: u64,
    /// Length of the reporting window when the caller gives no dates.
    pub summary_lookback_days: u32,
    pub forecast_lookback_days: u32,
    pub sources: Vec<Source>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_id: String::new(),
            terminal: DEFAULT_TERMINAL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            summary_lookback_days: DEFAULT_SUMMARY_LOOKBACK_DAYS,
            forecast_lookback_days: DEFAULT_FORECAST_LOOKBACK_DAYS,
            sources: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading engine configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Replaces the login credentials with any that are set in the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Ok(id) = std::env::var(ENV_API_ID) {
            self.api_id = id;
        }
        if let Ok(terminal) = std::env::var(ENV_TERMINAL) {
            self.terminal = terminal;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(AnalyticsError::ConfigError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.summary_lookback_days == 0 || self.forecast_lookback_days == 0 {
            return Err(AnalyticsError::ConfigError(
                "lookback periods must be at least one day".to_string(),
            ));
        }
        if self.summary_lookback_days > MAX_LOOKBACK_DAYS
            || self.forecast_lookback_days > MAX_LOOKBACK_DAYS
        {
            return Err(AnalyticsError::ConfigError(format!(
                "lookback periods must not exceed {} days",
                MAX_LOOKBACK_DAYS
            )));
        }
        if self.terminal.trim().is_empty() {
            return Err(AnalyticsError::ConfigError(
                "terminal must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id) {
                return Err(AnalyticsError::ConfigError(format!(
                    "source id {} is configured more than once",
                    source.id
                )));
            }
            if source.api_url.trim().is_empty() {
                return Err(AnalyticsError::ConfigError(format!(
                    "source '{}' has no api_url",
                    source.alias
                )));
            }
        }
        Ok(())
    }
}
