//! Runs one example suggestion request and prints the JSON response.
//!
//! Requires `OPENAI_API_KEY` and `OPENWEATHER_API_KEY`, either in the
//! environment or in a `.env` file.

use activity_helper::prelude::*;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout carries only the response
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    let gateway = Arc::new(OpenAIAssistantsGateway::with_config(config.openai)?);
    let helper = ActivityHelper::with_config(
        gateway,
        WeatherTool::with_config(config.weather),
        config.relay,
        config.model,
    );

    let mut session = helper.start_session().await.context("starting assistant session")?;

    let request = SuggestionRequest::new("San Francisco", "2 hours", ["outdoor", "active"]);
    let response = helper
        .request_suggestions(&mut session, &request)
        .await
        .context("requesting activity suggestions")?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
