use crate::error::{RelayError, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Descriptor for tool function parameters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDescriptor {
    pub r#type: String,
    pub function: FunctionDescriptor,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Build a function descriptor whose parameters are the JSON schema of `T`
    pub fn function<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDescriptor {
                name: name.into(),
                description: description.into(),
                parameters: serde_json::json!(schemars::schema_for!(T)),
            },
        }
    }
}

/// Trait for tools the remote model may call
#[async_trait]
pub trait LlmTool: Send + Sync {
    /// Execute the tool with given arguments
    async fn run(&self, args: &HashMap<String, Value>) -> Result<Value>;

    /// Get tool descriptor for the assistant definition
    fn descriptor(&self) -> ToolDescriptor;

    /// Name the remote model uses to call this tool
    fn name(&self) -> String {
        self.descriptor().function.name
    }

    /// Check if this tool matches the given name
    fn matches(&self, name: &str) -> bool {
        self.name() == name
    }
}

/// Decode tool call arguments into a typed argument struct
pub fn parse_args<T: DeserializeOwned>(args: &HashMap<String, Value>) -> Result<T> {
    let object: serde_json::Map<String, Value> =
        args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    serde_json::from_value(Value::Object(object))
        .map_err(|e| RelayError::ToolError(format!("Invalid arguments: {}", e)))
}
