//! Prompt construction from the conversation window.

pub mod prompt_builder;

pub use prompt_builder::build_conversation_prompt;
