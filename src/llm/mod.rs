pub mod gateway;
pub mod gateways;
pub mod models;
pub mod relay;
pub mod session;
pub mod tools;

pub use gateway::{AssistantDefinition, AssistantsGateway};
pub use models::{MessageRole, Run, RunStatus, ThreadMessage, ToolCall, ToolOutput};
pub use relay::{AssistantRelay, PollConfig, RelayConfig, TurnOutcome, UnknownToolPolicy};
pub use session::Session;
pub use tools::{FunctionDescriptor, LlmTool, ToolDescriptor};
