//! OpenAI Assistants gateway.
//!
//! This module talks to the Assistants API (v2): assistants, threads,
//! messages and runs, including tool-output submission.

use crate::error::{RelayError, Result};
use crate::llm::gateway::{AssistantDefinition, AssistantsGateway};
use crate::llm::models::{
    Assistant, MessageRole, Run, RunStatus, Thread, ThreadMessage, ToolCall, ToolOutput,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: &str = "assistants=v2";

/// Configuration for connecting to OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: None,
        }
    }
}

/// Gateway for the OpenAI Assistants service.
pub struct OpenAIAssistantsGateway {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIAssistantsGateway {
    /// Create a new gateway with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(OpenAIConfig::default())
    }

    /// Create a new gateway with custom configuration.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(OpenAIConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.authorized(self.client.get(self.url(path))).send().await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self
            .authorized(self.client.post(self.url(path)))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::GatewayError(format!(
                "OpenAI API error: {} - {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AssistantsGateway for OpenAIAssistantsGateway {
    async fn create_assistant(&self, definition: &AssistantDefinition) -> Result<Assistant> {
        info!(name = %definition.name, model = %definition.model, "Creating assistant");

        let body = json!({
            "name": definition.name,
            "instructions": definition.instructions,
            "model": definition.model,
            "tools": serde_json::to_value(&definition.tools)?,
        });

        let assistant: AssistantObject = self.post("/assistants", &body).await?;
        Ok(assistant.into())
    }

    async fn create_thread(&self) -> Result<Thread> {
        let thread: ThreadObject = self.post("/threads", &json!({})).await?;
        debug!(thread_id = %thread.id, "Created thread");
        Ok(Thread { id: thread.id })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let body = json!({ "role": role, "content": content });
        let message: MessageObject =
            self.post(&format!("/threads/{}/messages", thread_id), &body).await?;
        Ok(message.into())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let body = json!({ "assistant_id": assistant_id });
        let run: RunObject = self.post(&format!("/threads/{}/runs", thread_id), &body).await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let run: RunObject = self.get(&format!("/threads/{}/runs/{}", thread_id, run_id)).await?;
        Ok(run.into())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let body = json!({ "tool_outputs": outputs });
        let run: RunObject = self
            .post(
                &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
                &body,
            )
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let run: RunObject = self
            .post(&format!("/threads/{}/runs/{}/cancel", thread_id, run_id), &json!({}))
            .await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let page: MessageList =
            self.get(&format!("/threads/{}/messages?order=desc", thread_id)).await?;
        Ok(page.data.into_iter().map(ThreadMessage::from).collect())
    }
}

// Wire shapes. Only the fields the relay reads are declared.

#[derive(Deserialize)]
struct AssistantObject {
    id: String,
    name: Option<String>,
    model: String,
}

impl From<AssistantObject> for Assistant {
    fn from(value: AssistantObject) -> Self {
        Assistant {
            id: value.id,
            name: value.name,
            model: value.model,
        }
    }
}

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    id: String,
    role: MessageRole,
    #[serde(default)]
    content: Vec<ContentBlock>,
    run_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextContent {
    value: String,
}

impl From<MessageObject> for ThreadMessage {
    fn from(value: MessageObject) -> Self {
        let text = value.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.value),
            ContentBlock::Other => None,
        });

        ThreadMessage {
            id: value.id,
            role: value.role,
            text,
            run_id: value.run_id,
        }
    }
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
    required_action: Option<RequiredAction>,
    last_error: Option<LastError>,
}

#[derive(Deserialize)]
struct RequiredAction {
    submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Deserialize)]
struct SubmitToolOutputs {
    tool_calls: Vec<RunToolCall>,
}

#[derive(Deserialize)]
struct RunToolCall {
    id: String,
    function: RunFunctionCall,
}

#[derive(Deserialize)]
struct RunFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct LastError {
    code: Option<String>,
    message: String,
}

impl From<RunObject> for Run {
    fn from(value: RunObject) -> Self {
        let tool_calls = value
            .required_action
            .map(|action| {
                action
                    .submit_tool_outputs
                    .tool_calls
                    .into_iter()
                    .map(convert_tool_call)
                    .collect()
            })
            .unwrap_or_default();

        let last_error = value.last_error.map(|err| match err.code {
            Some(code) => format!("{}: {}", code, err.message),
            None => err.message,
        });

        Run {
            id: value.id,
            status: value.status,
            tool_calls,
            last_error,
        }
    }
}

/// Arguments arrive as a JSON-encoded string; anything unparseable becomes an empty map.
fn convert_tool_call(call: RunToolCall) -> ToolCall {
    let arguments: HashMap<String, Value> =
        serde_json::from_str(&call.function.arguments).unwrap_or_default();

    ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}
