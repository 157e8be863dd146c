//! Activity suggestions backed by a hosted assistant.
//!
//! [`ActivityHelper`] registers the "Activity Helper" assistant with the
//! weather and activity-search tools, turns a [`SuggestionRequest`] into a
//! user message, and relays the assistant's final answer back as a
//! [`SuggestionResponse`].

use crate::error::Result;
use crate::llm::gateway::AssistantsGateway;
use crate::llm::relay::{AssistantRelay, RelayConfig};
use crate::llm::session::Session;
use crate::llm::tools::{ActivitySearchTool, LlmTool, WeatherTool};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const ASSISTANT_NAME: &str = "Activity Helper";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const INSTRUCTIONS: &str = "You are an AI assistant that helps users find and plan activities for their free time. \
You can check weather, search for activities, and provide personalized recommendations. \
Always consider the user's preferences, available time, and current conditions when making suggestions.";

const NO_SUGGESTIONS: &str = "No suggestions generated";

/// What the user is looking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub location: String,
    pub time_available: String,
    pub preferences: Vec<String>,
}

impl SuggestionRequest {
    pub fn new(
        location: impl Into<String>,
        time_available: impl Into<String>,
        preferences: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            location: location.into(),
            time_available: time_available.into(),
            preferences: preferences.into_iter().map(Into::into).collect(),
        }
    }

    /// Render the request as the user message posted to the thread
    pub fn to_message(&self) -> String {
        format!(
            "Please suggest activities for:\nLocation: {}\nTime Available: {}\nPreferences: {}\n",
            self.location,
            self.time_available,
            self.preferences.join(", ")
        )
    }
}

/// Answer handed back to the caller
///
/// Serializes as `{"suggestions": ..., "timestamp": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionResponse {
    Suggestions { suggestions: String, timestamp: String },
    Error { error: String },
}

impl SuggestionResponse {
    /// Wrap an answer, stamped with the current local time (RFC 3339)
    pub fn suggestions(text: impl Into<String>) -> Self {
        SuggestionResponse::Suggestions {
            suggestions: text.into(),
            timestamp: Local::now().to_rfc3339(),
        }
    }

    pub fn no_suggestions() -> Self {
        SuggestionResponse::Error {
            error: NO_SUGGESTIONS.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SuggestionResponse::Error { .. })
    }
}

pub struct ActivityHelper {
    relay: AssistantRelay,
    model: String,
}

impl ActivityHelper {
    /// Create a helper exposing `get_weather` and `search_activities`
    pub fn new(gateway: Arc<dyn AssistantsGateway>, weather: WeatherTool) -> Self {
        Self::with_config(gateway, weather, RelayConfig::default(), DEFAULT_MODEL)
    }

    pub fn with_config(
        gateway: Arc<dyn AssistantsGateway>,
        weather: WeatherTool,
        config: RelayConfig,
        model: impl Into<String>,
    ) -> Self {
        let tools: Vec<Box<dyn LlmTool>> = vec![Box::new(weather), Box::new(ActivitySearchTool)];
        Self::with_relay(AssistantRelay::with_config(gateway, tools, config), model)
    }

    pub fn with_relay(relay: AssistantRelay, model: impl Into<String>) -> Self {
        Self {
            relay,
            model: model.into(),
        }
    }

    /// Register the assistant and open the conversation thread
    pub async fn start_session(&self) -> Result<Session> {
        self.relay.start_session(ASSISTANT_NAME, INSTRUCTIONS, &self.model).await
    }

    /// Ask the assistant for activity suggestions
    ///
    /// A run that completes without any assistant message yields
    /// [`SuggestionResponse::Error`]; failures of the remote session are
    /// returned as `Err`.
    pub async fn request_suggestions(
        &self,
        session: &mut Session,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse> {
        let request_id = Uuid::new_v4();
        info!(
            request_id = %request_id,
            location = %request.location,
            time_available = %request.time_available,
            "Requesting activity suggestions"
        );

        let outcome = self.relay.run_turn(session, &request.to_message()).await?;

        info!(
            request_id = %request_id,
            run_id = %outcome.run_id,
            tool_rounds = outcome.tool_rounds,
            answered = outcome.answer.is_some(),
            "Suggestion request finished"
        );

        Ok(match outcome.answer {
            Some(text) => SuggestionResponse::suggestions(text),
            None => SuggestionResponse::no_suggestions(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gateways::scripted::{ScriptedGateway, RUN_ID};
    use crate::llm::gateways::OpenAIAssistantsGateway;
    use crate::llm::models::{Run, RunStatus, ToolCall};
    use crate::llm::relay::PollConfig;
    use crate::llm::tools::WeatherConfig;
    use chrono::DateTime;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn fast_config() -> RelayConfig {
        RelayConfig {
            poll: PollConfig {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(2),
                multiplier: 2.0,
                timeout: Some(Duration::from_secs(5)),
            },
            ..Default::default()
        }
    }

    fn helper(gateway: Arc<dyn AssistantsGateway>, weather: WeatherTool) -> ActivityHelper {
        ActivityHelper::with_config(gateway, weather, fast_config(), DEFAULT_MODEL)
    }

    fn san_francisco() -> SuggestionRequest {
        SuggestionRequest::new("San Francisco", "2 hours", ["outdoor", "active"])
    }

    #[test]
    fn test_request_message() {
        let message = san_francisco().to_message();

        assert_eq!(
            message,
            "Please suggest activities for:\nLocation: San Francisco\nTime Available: 2 hours\nPreferences: outdoor, active\n"
        );
    }

    #[test]
    fn test_response_serialization() {
        let response = SuggestionResponse::Suggestions {
            suggestions: "Walk".to_string(),
            timestamp: "2024-05-01T10:00:00+00:00".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"suggestions": "Walk", "timestamp": "2024-05-01T10:00:00+00:00"})
        );

        let error = SuggestionResponse::no_suggestions();
        assert!(error.is_error());
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"error": "No suggestions generated"})
        );
    }

    #[tokio::test]
    async fn test_start_session_registers_activity_helper() {
        let gateway = Arc::new(ScriptedGateway::default());
        let helper = helper(gateway.clone(), WeatherTool::with_api_key("key"));

        let session = helper.start_session().await.unwrap();

        assert_eq!(session.model(), DEFAULT_MODEL);
        let definitions = gateway.definitions.lock().unwrap();
        assert_eq!(definitions[0].name, ASSISTANT_NAME);
        assert_eq!(definitions[0].instructions, INSTRUCTIONS);
        let names: Vec<_> = definitions[0].tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names, vec!["get_weather", "search_activities"]);
    }

    #[tokio::test]
    async fn test_san_francisco_scenario() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![Run::new(RUN_ID, RunStatus::Completed)],
            vec![
                ScriptedGateway::assistant_reply("Try hiking in Golden Gate Park"),
                ScriptedGateway::user_message("Please suggest activities for: ..."),
            ],
        ));
        let helper = helper(gateway.clone(), WeatherTool::with_api_key("key"));
        let mut session = helper.start_session().await.unwrap();

        let response = helper.request_suggestions(&mut session, &san_francisco()).await.unwrap();

        match response {
            SuggestionResponse::Suggestions {
                suggestions,
                timestamp,
            } => {
                assert_eq!(suggestions, "Try hiking in Golden Gate Park");
                assert!(DateTime::parse_from_rfc3339(&timestamp).is_ok());
            }
            other => panic!("Expected suggestions, got {:?}", other),
        }
        assert_eq!(gateway.posted.lock().unwrap()[0], san_francisco().to_message());
    }

    #[tokio::test]
    async fn test_no_assistant_message_yields_error_response() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![Run::new(RUN_ID, RunStatus::Completed)],
            vec![ScriptedGateway::user_message("Please suggest activities for: ...")],
        ));
        let helper = helper(gateway, WeatherTool::with_api_key("key"));
        let mut session = helper.start_session().await.unwrap();

        let response = helper.request_suggestions(&mut session, &san_francisco()).await.unwrap();

        assert_eq!(response, SuggestionResponse::no_suggestions());
    }

    #[tokio::test]
    async fn test_expired_run_is_error() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Run::new(RUN_ID, RunStatus::Expired)], vec![]));
        let helper = helper(gateway, WeatherTool::with_api_key("key"));
        let mut session = helper.start_session().await.unwrap();

        let result = helper.request_suggestions(&mut session, &san_francisco()).await;

        assert!(matches!(result, Err(crate::RelayError::ServiceError(_))));
    }

    #[tokio::test]
    async fn test_weather_tool_call_is_serviced_during_turn() {
        let mut weather_server = Server::new_async().await;
        let weather_mock = weather_server
            .mock("GET", "/weather")
            .match_query(Matcher::UrlEncoded("q".into(), "San Francisco".into()))
            .with_status(200)
            .with_body(r#"{"temp": 15}"#)
            .create_async()
            .await;

        let weather = WeatherTool::with_config(WeatherConfig {
            api_key: "weather-key".to_string(),
            base_url: format!("{}/weather", weather_server.url()),
            units: "metric".to_string(),
        });

        let tool_call = ToolCall {
            id: "call_weather".to_string(),
            name: "get_weather".to_string(),
            arguments: HashMap::from([("location".to_string(), json!("San Francisco"))]),
        };
        let gateway = Arc::new(ScriptedGateway::new(
            vec![
                Run::new(RUN_ID, RunStatus::RequiresAction).with_tool_calls(vec![tool_call]),
                Run::new(RUN_ID, RunStatus::Completed),
            ],
            vec![ScriptedGateway::assistant_reply("It is 15 degrees, go for a run")],
        ));
        let helper = helper(gateway.clone(), weather);
        let mut session = helper.start_session().await.unwrap();

        let response = helper.request_suggestions(&mut session, &san_francisco()).await.unwrap();

        weather_mock.assert_async().await;
        assert!(!response.is_error());
        let submissions = gateway.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0][0].tool_call_id, "call_weather");
        assert_eq!(submissions[0][0].output, r#"{"temp":15}"#);
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let mut server = Server::new_async().await;
        let assistant = server
            .mock("POST", "/assistants")
            .with_status(200)
            .with_body(r#"{"id":"asst_1","name":"Activity Helper","model":"gpt-4-turbo-preview"}"#)
            .create_async()
            .await;
        let thread = server
            .mock("POST", "/threads")
            .with_status(200)
            .with_body(r#"{"id":"thread_1"}"#)
            .create_async()
            .await;
        let message = server
            .mock("POST", "/threads/thread_1/messages")
            .match_body(Matcher::PartialJson(json!({"role": "user"})))
            .with_status(200)
            .with_body(r#"{"id":"msg_1","role":"user","content":[]}"#)
            .create_async()
            .await;
        let run = server
            .mock("POST", "/threads/thread_1/runs")
            .with_status(200)
            .with_body(
                r#"{"id":"run_1","status":"requires_action","required_action":{"type":"submit_tool_outputs",
                "submit_tool_outputs":{"tool_calls":[{"id":"call_1","type":"function",
                "function":{"name":"search_activities","arguments":"{\"query\":\"outdoor\",\"location\":\"San Francisco\"}"}}]}}}"#,
            )
            .create_async()
            .await;
        let submit = server
            .mock("POST", "/threads/thread_1/runs/run_1/submit_tool_outputs")
            .match_body(Matcher::Regex("call_1".to_string()))
            .with_status(200)
            .with_body(r#"{"id":"run_1","status":"queued"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/threads/thread_1/runs/run_1")
            .with_status(200)
            .with_body(r#"{"id":"run_1","status":"completed"}"#)
            .create_async()
            .await;
        let transcript = server
            .mock("GET", "/threads/thread_1/messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data":[{"id":"msg_2","role":"assistant","run_id":"run_1",
                "content":[{"type":"text","text":{"value":"Try hiking in Golden Gate Park","annotations":[]}}]}]}"#,
            )
            .create_async()
            .await;

        let gateway =
            Arc::new(OpenAIAssistantsGateway::with_api_key_and_base_url("key", server.url()).unwrap());
        let helper = helper(gateway, WeatherTool::with_api_key("key"));
        let mut session = helper.start_session().await.unwrap();

        let response = helper.request_suggestions(&mut session, &san_francisco()).await.unwrap();

        for mock in [&assistant, &thread, &message, &run, &submit, &poll, &transcript] {
            mock.assert_async().await;
        }
        match response {
            SuggestionResponse::Suggestions { suggestions, .. } => {
                assert_eq!(suggestions, "Try hiking in Golden Gate Park");
            }
            other => panic!("Expected suggestions, got {:?}", other),
        }
    }
}
