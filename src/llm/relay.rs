use crate::error::{RelayError, Result};
use crate::llm::gateway::{AssistantDefinition, AssistantsGateway};
use crate::llm::models::{MessageRole, Run, RunStatus, ToolCall, ToolOutput};
use crate::llm::session::Session;
use crate::llm::tools::{LlmTool, ToolDescriptor};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to do with a tool call whose name matches no registered tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownToolPolicy {
    /// Submit nothing for the call. The provider expects an output for every
    /// call, so a run that hits this usually stalls until it expires.
    Skip,
    /// Submit `{"error": "Unknown tool: <name>"}` as the call's output
    #[default]
    ErrorOutput,
    /// Abort the turn with [`RelayError::UnknownTool`]
    Fail,
}

impl FromStr for UnknownToolPolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(UnknownToolPolicy::Skip),
            "error" => Ok(UnknownToolPolicy::ErrorOutput),
            "fail" => Ok(UnknownToolPolicy::Fail),
            other => Err(RelayError::ConfigError(format!(
                "unknown tool policy '{}', expected skip, error or fail",
                other
            ))),
        }
    }
}

/// Backoff and time budget for polling a run
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Upper bound on the whole poll loop; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
            multiplier: 2.0,
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl PollConfig {
    /// Grow `current` by `multiplier`, never past `max_interval`
    ///
    /// A multiplier that is not a finite number of at least 1.0 leaves the
    /// interval unchanged.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };

        Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

/// Configuration for the relay loop
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub poll: PollConfig,
    pub unknown_tools: UnknownToolPolicy,
}

/// Result of one turn on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub run_id: String,
    /// Text of the most recent assistant message, if there is one
    pub answer: Option<String>,
    /// Number of `requires_action` rounds serviced during the run
    pub tool_rounds: usize,
}

/// Relays turns to a hosted assistant and services its tool calls
///
/// The relay owns the gateway and the local tools; the remote session is
/// passed in by the caller on every turn.
pub struct AssistantRelay {
    gateway: Arc<dyn AssistantsGateway>,
    tools: Vec<Box<dyn LlmTool>>,
    config: RelayConfig,
}

impl AssistantRelay {
    pub fn new(gateway: Arc<dyn AssistantsGateway>, tools: Vec<Box<dyn LlmTool>>) -> Self {
        Self::with_config(gateway, tools, RelayConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn AssistantsGateway>,
        tools: Vec<Box<dyn LlmTool>>,
        config: RelayConfig,
    ) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }

    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Register an assistant exposing this relay's tools and open a thread for it
    pub async fn start_session(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
    ) -> Result<Session> {
        let definition = AssistantDefinition {
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: model.to_string(),
            tools: self.tool_descriptors(),
        };

        let assistant = self.gateway.create_assistant(&definition).await?;
        let thread = self.gateway.create_thread().await?;

        info!(
            assistant_id = %assistant.id,
            thread_id = %thread.id,
            tools = definition.tools.len(),
            "Session started"
        );

        Ok(Session::new(assistant, thread))
    }

    /// Post `content` as a user message and run the assistant until it completes
    ///
    /// Tool calls requested along the way are dispatched to the local tools
    /// and their outputs submitted before polling resumes. Fails with
    /// [`RelayError::ServiceError`] when the run ends in a failure state or
    /// exceeds the poll budget. Whenever the turn fails while the run is
    /// still live, the run is cancelled so the thread can take the next turn.
    pub async fn run_turn(&self, session: &mut Session, content: &str) -> Result<TurnOutcome> {
        self.gateway.create_message(session.thread_id(), MessageRole::User, content).await?;
        let run = self.gateway.create_run(session.thread_id(), session.assistant_id()).await?;
        let run_id = run.id.clone();

        info!(thread_id = %session.thread_id(), run_id = %run_id, "Run started");

        let polled = match self.config.poll.timeout {
            Some(budget) => {
                match tokio::time::timeout(budget, self.poll_until_complete(session, run)).await {
                    Ok(polled) => polled,
                    Err(_) => {
                        self.abandon_run(session, &run_id, "poll budget exceeded").await;
                        return Err(RelayError::ServiceError(format!(
                            "run {} did not complete within {:?}",
                            run_id, budget
                        )));
                    }
                }
            }
            None => self.poll_until_complete(session, run).await,
        };

        let tool_rounds = match polled {
            Ok(rounds) => rounds,
            // The poll loop only raises ServiceError for runs already in a failure state
            Err(e @ RelayError::ServiceError(_)) => return Err(e),
            Err(e) => {
                self.abandon_run(session, &run_id, &e.to_string()).await;
                return Err(e);
            }
        };

        session.record_completed_turn();

        let answer = self.latest_answer(session, &run_id).await?;
        if answer.is_none() {
            warn!(run_id = %run_id, "Run completed without an assistant message");
        }

        Ok(TurnOutcome {
            run_id,
            answer,
            tool_rounds,
        })
    }

    /// Dispatch a batch of tool calls one after another, in arrival order
    pub async fn dispatch_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            if let Some(output) = self.dispatch(call).await? {
                outputs.push(output);
            }
        }

        Ok(outputs)
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<Option<ToolOutput>> {
        let Some(tool) = self.tools.iter().find(|t| t.matches(&call.name)) else {
            return self.unknown_tool(call);
        };

        info!(tool = %call.name, tool_call_id = %call.id, "Executing tool");

        let value = match tool.run(&call.arguments).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                json!({ "error": e.to_string() })
            }
        };

        Ok(Some(ToolOutput::from_value(&call.id, &value)?))
    }

    fn unknown_tool(&self, call: &ToolCall) -> Result<Option<ToolOutput>> {
        match self.config.unknown_tools {
            UnknownToolPolicy::Skip => {
                warn!(tool = %call.name, tool_call_id = %call.id, "Tool not found, skipping");
                Ok(None)
            }
            UnknownToolPolicy::ErrorOutput => {
                warn!(tool = %call.name, tool_call_id = %call.id, "Tool not found");
                let value = json!({ "error": format!("Unknown tool: {}", call.name) });
                Ok(Some(ToolOutput::from_value(&call.id, &value)?))
            }
            UnknownToolPolicy::Fail => Err(RelayError::UnknownTool(call.name.clone())),
        }
    }

    async fn poll_until_complete(&self, session: &Session, mut run: Run) -> Result<usize> {
        let poll = &self.config.poll;
        let mut interval = poll.initial_interval;
        let mut rounds = 0;

        loop {
            let status = run.status;
            match status {
                RunStatus::Completed => {
                    info!(run_id = %run.id, tool_rounds = rounds, "Run completed");
                    return Ok(rounds);
                }
                RunStatus::RequiresAction => {
                    rounds += 1;
                    info!(
                        run_id = %run.id,
                        round = rounds,
                        tool_calls = run.tool_calls.len(),
                        "Run requires action"
                    );

                    let outputs = self.dispatch_tool_calls(&run.tool_calls).await?;
                    run = self
                        .gateway
                        .submit_tool_outputs(session.thread_id(), &run.id, &outputs)
                        .await?;
                    interval = poll.initial_interval;
                }
                status if status.is_failure() => {
                    return Err(RelayError::ServiceError(match run.last_error {
                        Some(message) => format!("run {} {}: {}", run.id, status, message),
                        None => format!("run {} {}", run.id, status),
                    }));
                }
                status => {
                    debug!(run_id = %run.id, status = %status, wait = ?interval, "Polling run");
                    tokio::time::sleep(interval).await;
                    interval = poll.next_interval(interval);
                    run = self.gateway.retrieve_run(session.thread_id(), &run.id).await?;
                }
            }
        }
    }

    async fn abandon_run(&self, session: &Session, run_id: &str, reason: &str) {
        warn!(run_id = run_id, reason = reason, "Cancelling run");

        if let Err(e) = self.gateway.cancel_run(session.thread_id(), run_id).await {
            warn!(run_id = run_id, error = %e, "Failed to cancel run");
        }
    }

    async fn latest_answer(&self, session: &Session, run_id: &str) -> Result<Option<String>> {
        let messages = self.gateway.list_messages(session.thread_id()).await?;

        Ok(messages
            .into_iter()
            .filter(|m| m.is_assistant() && m.is_from_run(run_id))
            .find_map(|m| m.text))
    }
}
