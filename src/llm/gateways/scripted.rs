//! In-process gateway that replays a scripted sequence of run states.

use crate::error::Result;
use crate::llm::gateway::{AssistantDefinition, AssistantsGateway};
use crate::llm::models::{
    Assistant, MessageRole, Run, RunStatus, Thread, ThreadMessage, ToolOutput,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) const RUN_ID: &str = "run_1";

/// Each `retrieve_run` pops the next scripted run; once the script is
/// exhausted the run stays `in_progress` forever.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    script: Mutex<VecDeque<Run>>,
    transcript: Vec<ThreadMessage>,
    pub definitions: Mutex<Vec<AssistantDefinition>>,
    pub posted: Mutex<Vec<String>>,
    pub submissions: Mutex<Vec<Vec<ToolOutput>>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Run>, transcript: Vec<ThreadMessage>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            transcript,
            ..Default::default()
        }
    }

    /// Assistant message authored by the scripted run
    pub fn assistant_reply(text: &str) -> ThreadMessage {
        Self::assistant_reply_from(RUN_ID, text)
    }

    pub fn assistant_reply_from(run_id: &str, text: &str) -> ThreadMessage {
        ThreadMessage {
            id: format!("msg_{}", run_id),
            role: MessageRole::Assistant,
            text: Some(text.to_string()),
            run_id: Some(run_id.to_string()),
        }
    }

    pub fn user_message(text: &str) -> ThreadMessage {
        ThreadMessage {
            id: "msg_1".to_string(),
            role: MessageRole::User,
            text: Some(text.to_string()),
            run_id: None,
        }
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl AssistantsGateway for ScriptedGateway {
    async fn create_assistant(&self, definition: &AssistantDefinition) -> Result<Assistant> {
        self.definitions.lock().unwrap().push(definition.clone());
        Ok(Assistant {
            id: "asst_1".to_string(),
            name: Some(definition.name.clone()),
            model: definition.model.clone(),
        })
    }

    async fn create_thread(&self) -> Result<Thread> {
        Ok(Thread {
            id: "thread_1".to_string(),
        })
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        self.posted.lock().unwrap().push(content.to_string());
        Ok(ThreadMessage {
            id: "msg_1".to_string(),
            role,
            text: Some(content.to_string()),
            run_id: None,
        })
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<Run> {
        Ok(Run::new(RUN_ID, RunStatus::Queued))
    }

    async fn retrieve_run(&self, _thread_id: &str, run_id: &str) -> Result<Run> {
        let next = self.script.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| Run::new(run_id, RunStatus::InProgress)))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        self.submissions.lock().unwrap().push(outputs.to_vec());
        Ok(Run::new(run_id, RunStatus::Queued))
    }

    async fn cancel_run(&self, _thread_id: &str, run_id: &str) -> Result<Run> {
        self.cancelled.lock().unwrap().push(run_id.to_string());
        Ok(Run::new(run_id, RunStatus::Cancelling))
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>> {
        Ok(self.transcript.clone())
    }
}
