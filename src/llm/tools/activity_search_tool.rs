use crate::error::Result;
use crate::llm::tools::{parse_args, LlmTool, ToolDescriptor};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// An activity the search returned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityResult {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub cost: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchActivitiesArgs {
    /// Search query for activities
    query: String,
    /// Location to search in
    location: String,
}

/// Activity search exposed to the assistant as `search_activities`
///
/// No activities provider is wired in yet: every search answers with a
/// single synthetic entry built from the query and location.
#[derive(Debug, Clone, Default)]
pub struct ActivitySearchTool;

impl ActivitySearchTool {
    pub fn new() -> Self {
        Self
    }

    pub fn search_activities(&self, query: &str, location: &str) -> Vec<ActivityResult> {
        vec![ActivityResult {
            name: "Sample Activity".to_string(),
            description: format!("Activity related to {} in {}", query, location),
            duration: "2 hours".to_string(),
            cost: "Free".to_string(),
        }]
    }
}

#[async_trait]
impl LlmTool for ActivitySearchTool {
    async fn run(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let args: SearchActivitiesArgs = parse_args(args)?;
        Ok(json!(self.search_activities(&args.query, &args.location)))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function::<SearchActivitiesArgs>(
            "search_activities",
            "Search for activities based on preferences and location",
        )
    }
}
