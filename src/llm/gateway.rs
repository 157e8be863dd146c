use crate::error::Result;
use crate::llm::models::{Assistant, MessageRole, Run, Thread, ThreadMessage, ToolOutput};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;

/// Definition used to register an assistant with the provider
#[derive(Debug, Clone)]
pub struct AssistantDefinition {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<ToolDescriptor>,
}

/// Abstract interface for hosted assistant providers
///
/// Each method maps to one remote call. Implementations do not retry.
#[async_trait]
pub trait AssistantsGateway: Send + Sync {
    /// Register an assistant with its instructions and tools
    async fn create_assistant(&self, definition: &AssistantDefinition) -> Result<Assistant>;

    /// Open a new conversation thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to a thread
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// Start a run of `assistant_id` over the thread
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Fetch the current state of a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Submit tool outputs for a run waiting in `requires_action`
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    /// Ask the provider to cancel an in-flight run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// List thread messages, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
