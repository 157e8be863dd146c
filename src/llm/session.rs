//! Handle on a remote conversation.
//!
//! A [`Session`] pairs the assistant that answers with the thread that holds
//! the conversation. Both live on the provider's side; the handle only
//! carries their ids. Turns borrow the session mutably, so a session can
//! never have two runs polled at once.

use crate::llm::models::{Assistant, Thread};

#[derive(Debug, Clone)]
pub struct Session {
    assistant: Assistant,
    thread: Thread,
    completed_turns: usize,
}

impl Session {
    pub fn new(assistant: Assistant, thread: Thread) -> Self {
        Self {
            assistant,
            thread,
            completed_turns: 0,
        }
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant.id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread.id
    }

    pub fn model(&self) -> &str {
        &self.assistant.model
    }

    /// Number of turns that ran to completion on this session
    pub fn completed_turns(&self) -> usize {
        self.completed_turns
    }

    pub(crate) fn record_completed_turn(&mut self) {
        self.completed_turns += 1;
    }
}
