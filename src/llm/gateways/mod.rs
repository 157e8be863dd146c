pub mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use openai::{OpenAIAssistantsGateway, OpenAIConfig};
