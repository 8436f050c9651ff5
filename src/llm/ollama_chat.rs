//! Ollama chat model through Rig.

use reqwest::Client as ReqwestClient;
use rig::client::{CompletionClient, Nothing};
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use tracing::debug;

use crate::llm::chat_model::{ChatFuture, ChatModel};
use crate::memory::core::config::LlmConfig;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::message::ChatMessage;
use crate::memory::prompt::build_conversation_prompt;

/// Completion-backed chat model served by Ollama.
pub struct OllamaChatModel {
    model: ollama::CompletionModel,
    model_name: String,
    temperature: f64,
    max_tokens: Option<u64>,
    system_prompt: Option<String>,
}

impl OllamaChatModel {
    /// Build a chat model from config.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig) -> MemoryResult<Self> {
        let client = ollama::Client::<ReqwestClient>::builder()
            .api_key(Nothing)
            .base_url(&config.base_url)
            .build()
            .map_err(MemoryError::from)?;
        let model = client.completion_model(config.model.clone());

        Ok(Self {
            model,
            model_name: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        })
    }
}

impl ChatModel for OllamaChatModel {
    fn invoke<'a>(
        &'a self,
        context: &'a [ChatMessage],
        new_message: &'a str,
    ) -> ChatFuture<'a, MemoryResult<String>> {
        Box::pin(async move {
            let prompt = build_conversation_prompt(context, new_message);
            debug!(
                model = %self.model_name,
                context = context.len(),
                prompt_chars = prompt.len(),
                "invoking chat model"
            );

            let builder = self
                .model
                .completion_request(prompt)
                .temperature(self.temperature)
                .max_tokens_opt(self.max_tokens);
            let builder = match &self.system_prompt {
                Some(system) => builder.preamble(system.clone()),
                None => builder,
            };

            let response = self.model.completion(builder.build()).await?;
            let text = extract_text(&response.choice);
            if text.trim().is_empty() {
                return Err(MemoryError::Model(format!(
                    "{} returned no text content",
                    self.model_name
                )));
            }
            Ok(text)
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}
