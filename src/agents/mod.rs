//! Agents built on the assistant relay.

pub mod activity_helper;

pub use activity_helper::{ActivityHelper, SuggestionRequest, SuggestionResponse};
