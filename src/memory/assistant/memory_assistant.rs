//! Chat orchestration over the memory provider and a chat model.

use std::sync::Arc;

use tracing::{debug, info};

use crate::llm::chat_model::ChatModel;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::ConversationId;
use crate::memory::core::message::ChatMessage;
use crate::memory::core::turn::decode_turns;
use crate::memory::provider::MemoryProvider;

/// Assistant that remembers each conversation through a [`MemoryProvider`].
pub struct MemoryAssistant {
    provider: Arc<MemoryProvider>,
    model: Arc<dyn ChatModel>,
}

impl MemoryAssistant {
    /// Create an assistant.
    #[must_use]
    pub fn new(provider: Arc<MemoryProvider>, model: Arc<dyn ChatModel>) -> Self {
        Self { provider, model }
    }

    /// Memory provider used by this assistant.
    #[must_use]
    pub const fn provider(&self) -> &Arc<MemoryProvider> {
        &self.provider
    }

    /// Name of the backing model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Answer `text` in the context of conversation `id`.
    ///
    /// The model sees the configured window of earlier turns. The user message
    /// and the reply are persisted only once the model has answered, so a
    /// failed call leaves the conversation untouched.
    ///
    /// # Errors
    /// Returns [`MemoryError::InvalidInput`] for blank text, otherwise any
    /// storage, decoding or model failure.
    pub async fn chat(&self, id: ConversationId, text: &str) -> MemoryResult<String> {
        if text.trim().is_empty() {
            return Err(MemoryError::InvalidInput(
                "text message must not be empty".to_string(),
            ));
        }

        let _guard = self.provider.lock(id).await;

        let window = self.provider.current_window(id).await?;
        let context = decode_turns(&window)?;
        debug!(conversation = %id, window = context.len(), "loaded memory window");

        let reply = self.model.invoke(&context, text).await?;

        self.provider
            .record_message(id, &ChatMessage::user(text))
            .await?;
        self.provider
            .record_message(id, &ChatMessage::ai(reply.as_str()))
            .await?;

        info!(
            conversation = %id,
            model = self.model.model_name(),
            reply_chars = reply.len(),
            "answered message"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::test_support::{EchoModel, FailingModel};
    use crate::memory::core::config::{RetentionPolicy, WindowConfig};
    use crate::memory::core::turn::ConversationTurn;
    use crate::memory::store::InMemoryStore;

    fn provider(max_messages: usize) -> Arc<MemoryProvider> {
        Arc::new(MemoryProvider::new(
            Arc::new(InMemoryStore::new()),
            WindowConfig {
                max_messages,
                retention: RetentionPolicy::TrimOnRead,
            },
        ))
    }

    fn stored(turns: &[ConversationTurn]) -> Vec<ChatMessage> {
        turns.iter().filter_map(|t| t.message().ok()).collect()
    }

    #[tokio::test]
    async fn test_chat_records_exchange() {
        let provider = provider(100);
        let model = Arc::new(EchoModel::default());
        let assistant = MemoryAssistant::new(Arc::clone(&provider), model.clone());
        let id = ConversationId::new(42);

        let reply = assistant.chat(id, "hello").await;
        assert_eq!(reply.ok().as_deref(), Some("echo: hello"));

        let reply = assistant.chat(id, "again").await;
        assert_eq!(reply.ok().as_deref(), Some("echo: again"));

        let history = stored(&provider.history(id).await.unwrap_or_default());
        assert_eq!(
            history,
            vec![
                ChatMessage::user("hello"),
                ChatMessage::ai("echo: hello"),
                ChatMessage::user("again"),
                ChatMessage::ai("echo: again"),
            ]
        );

        let calls = model.recorded();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.is_empty());
        assert_eq!(
            calls[1].0,
            vec![ChatMessage::user("hello"), ChatMessage::ai("echo: hello")]
        );
        assert_eq!(provider.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_model_sees_only_window() {
        let provider = provider(3);
        let model = Arc::new(EchoModel::default());
        let assistant = MemoryAssistant::new(Arc::clone(&provider), model.clone());
        let id = ConversationId::new(7);

        for text in ["one", "two", "three"] {
            assert!(assistant.chat(id, text).await.is_ok());
        }

        let calls = model.recorded();
        let last_context = calls.last().map(|c| c.0.clone()).unwrap_or_default();
        assert_eq!(
            last_context,
            vec![
                ChatMessage::ai("echo: one"),
                ChatMessage::user("two"),
                ChatMessage::ai("echo: two"),
            ]
        );
        // Trim-on-read keeps the full log.
        assert_eq!(provider.store().count(id).await.unwrap_or(0), 6);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let provider = provider(10);
        let assistant = MemoryAssistant::new(Arc::clone(&provider), Arc::new(EchoModel::default()));
        let id = ConversationId::new(1);

        let result = assistant.chat(id, "   ").await;
        assert!(matches!(result, Err(MemoryError::InvalidInput(_))));
        assert_eq!(provider.store().count(id).await.unwrap_or(99), 0);
    }

    #[tokio::test]
    async fn test_model_failure_persists_nothing() {
        let provider = provider(10);
        let assistant = MemoryAssistant::new(Arc::clone(&provider), Arc::new(FailingModel));
        let id = ConversationId::new(1);

        let result = assistant.chat(id, "hi").await;
        assert!(matches!(result, Err(ref err) if err.is_model_failure()));
        assert_eq!(provider.store().count(id).await.unwrap_or(99), 0);
    }

    #[tokio::test]
    async fn test_corrupt_payload_surfaces() {
        let provider = provider(10);
        let id = ConversationId::new(3);
        assert!(
            provider
                .store()
                .append(id, vec!["{broken".to_string()])
                .await
                .is_ok()
        );
        let assistant = MemoryAssistant::new(Arc::clone(&provider), Arc::new(EchoModel::default()));

        let result = assistant.chat(id, "hi").await;
        assert!(matches!(result, Err(MemoryError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let provider = provider(100);
        let model = Arc::new(EchoModel::with_delay(Duration::from_millis(20)));
        let assistant = MemoryAssistant::new(Arc::clone(&provider), model.clone());
        let id = ConversationId::new(11);

        let (first, second) = tokio::join!(assistant.chat(id, "first"), assistant.chat(id, "second"));
        assert!(first.is_ok());
        assert!(second.is_ok());

        // Each exchange is stored contiguously: user then its own reply.
        let history = stored(&provider.history(id).await.unwrap_or_default());
        assert_eq!(history.len(), 4);
        for pair in history.chunks(2) {
            assert_eq!(pair[1].text(), format!("echo: {}", pair[0].text()));
        }

        // The later call saw the earlier exchange.
        let calls = model.recorded();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0.len(), 2);
    }
}
