use crate::error::Result;
use crate::llm::tools::{parse_args, LlmTool, ToolDescriptor};
use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FETCH_FAILED: &str = "Failed to fetch weather data";

/// Configuration for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENWEATHER_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            units: "metric".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetWeatherArgs {
    /// City name or coordinates
    location: String,
}

/// Current-weather lookup exposed to the assistant as `get_weather`
///
/// A non-success response from the provider is reported to the model as
/// `{"error": "Failed to fetch weather data"}` rather than failing the turn.
#[derive(Clone)]
pub struct WeatherTool {
    client: Client,
    config: WeatherConfig,
}

impl WeatherTool {
    /// Create a weather tool with configuration from the environment.
    pub fn new() -> Self {
        Self::with_config(WeatherConfig::default())
    }

    pub fn with_config(config: WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::with_config(WeatherConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Fetch current conditions for `location`; the provider's JSON body is passed through.
    ///
    /// Any failure, including transport and decode errors, yields the
    /// `{"error": "Failed to fetch weather data"}` payload. The request URL
    /// carries the API key, so it never appears in the payload or the logs.
    pub async fn get_weather(&self, location: &str) -> Result<Value> {
        debug!(location = location, "Fetching current weather");

        let response = match self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("q", location),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(location = location, error = %e.without_url(), "Weather request failed");
                return Ok(json!({ "error": FETCH_FAILED }));
            }
        };

        if !response.status().is_success() {
            warn!(location = location, status = %response.status(), "Weather lookup failed");
            return Ok(json!({ "error": FETCH_FAILED }));
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(body),
            Err(e) => {
                warn!(location = location, error = %e.without_url(), "Weather response was not JSON");
                Ok(json!({ "error": FETCH_FAILED }))
            }
        }
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmTool for WeatherTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let args: GetWeatherArgs = parse_args(args)?;
        self.get_weather(&args.location).await
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function::<GetWeatherArgs>(
            "get_weather",
            "Get current weather conditions for a location",
        )
    }
}
