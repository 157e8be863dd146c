//! Environment-sourced configuration.
//!
//! Everything is read through a lookup function so the parsing can be
//! exercised without touching the process environment.

use crate::agents::activity_helper::DEFAULT_MODEL;
use crate::error::{RelayError, Result};
use crate::llm::gateways::openai::{self, OpenAIConfig};
use crate::llm::relay::{PollConfig, RelayConfig, UnknownToolPolicy};
use crate::llm::tools::weather_tool::{self, WeatherConfig};
use std::str::FromStr;
use std::time::Duration;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_API_ENDPOINT: &str = "OPENAI_API_ENDPOINT";
pub const OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const OPENWEATHER_API_ENDPOINT: &str = "OPENWEATHER_API_ENDPOINT";
pub const MODEL: &str = "ACTIVITY_HELPER_MODEL";
pub const POLL_INTERVAL_MS: &str = "ACTIVITY_HELPER_POLL_INTERVAL_MS";
pub const POLL_MAX_INTERVAL_MS: &str = "ACTIVITY_HELPER_POLL_MAX_INTERVAL_MS";
pub const POLL_TIMEOUT_SECS: &str = "ACTIVITY_HELPER_POLL_TIMEOUT_SECS";
pub const UNKNOWN_TOOLS: &str = "ACTIVITY_HELPER_UNKNOWN_TOOLS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAIConfig,
    pub weather: WeatherConfig,
    pub relay: RelayConfig,
    pub model: String,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Both API keys are required. A poll timeout of `0` disables the budget.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_key = get(OPENAI_API_KEY)
            .ok_or_else(|| RelayError::ConfigError(format!("{} is not set", OPENAI_API_KEY)))?;
        let weather_key = get(OPENWEATHER_API_KEY).ok_or_else(|| {
            RelayError::ConfigError(format!("{} is not set", OPENWEATHER_API_KEY))
        })?;

        let openai = OpenAIConfig {
            api_key: openai_key,
            base_url: get(OPENAI_API_ENDPOINT)
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
            timeout: None,
        };

        let weather = WeatherConfig {
            api_key: weather_key,
            base_url: get(OPENWEATHER_API_ENDPOINT)
                .unwrap_or_else(|| weather_tool::DEFAULT_BASE_URL.to_string()),
            units: "metric".to_string(),
        };

        let poll_defaults = PollConfig::default();
        let poll = PollConfig {
            initial_interval: parse_or(get(POLL_INTERVAL_MS), POLL_INTERVAL_MS)?
                .map(Duration::from_millis)
                .unwrap_or(poll_defaults.initial_interval),
            max_interval: parse_or(get(POLL_MAX_INTERVAL_MS), POLL_MAX_INTERVAL_MS)?
                .map(Duration::from_millis)
                .unwrap_or(poll_defaults.max_interval),
            multiplier: poll_defaults.multiplier,
            timeout: match parse_or::<u64>(get(POLL_TIMEOUT_SECS), POLL_TIMEOUT_SECS)? {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => poll_defaults.timeout,
            },
        };

        if poll.max_interval < poll.initial_interval {
            return Err(RelayError::ConfigError(format!(
                "{} must not be smaller than {}",
                POLL_MAX_INTERVAL_MS, POLL_INTERVAL_MS
            )));
        }

        let unknown_tools = match get(UNKNOWN_TOOLS) {
            Some(value) => value.parse::<UnknownToolPolicy>()?,
            None => UnknownToolPolicy::default(),
        };

        Ok(Self {
            openai,
            weather,
            relay: RelayConfig {
                poll,
                unknown_tools,
            },
            model: get(MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| RelayError::ConfigError(format!("{} has invalid value '{}'", key, v)))
        })
        .transpose()
}
