//! Language-model integration: the invocation contract and its Ollama backend.

pub mod chat_model;
pub mod ollama_chat;
pub mod ollama_probe;

pub use chat_model::{ChatFuture, ChatModel};
pub use ollama_chat::OllamaChatModel;
pub use ollama_probe::OllamaProbe;

#[cfg(test)]
pub(crate) mod test_support;
