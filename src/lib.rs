pub mod agents;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{RelayError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agents::{ActivityHelper, SuggestionRequest, SuggestionResponse};
    pub use crate::config::AppConfig;
    pub use crate::error::{RelayError, Result};
    pub use crate::llm::gateways::OpenAIAssistantsGateway;
    pub use crate::llm::tools::{ActivitySearchTool, LlmTool, WeatherTool};
    pub use crate::llm::{AssistantRelay, AssistantsGateway, RelayConfig, Session};
}
