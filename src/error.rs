//! Error types and result aliases for the activity helper.
//!
//! [`RelayError`] covers everything that can abort a turn: remote assistant
//! failures, HTTP and serialization faults, configuration problems and tool
//! dispatch errors. Failures the remote model should see instead (a failed
//! weather lookup, a tool that could not run) are turned into tool outputs
//! by the relay and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Assistants gateway error: {0}")]
    GatewayError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
