//! Model-invocation contract used by the assistant.

use std::future::Future;
use std::pin::Pin;

use crate::memory::core::errors::MemoryResult;
use crate::memory::core::message::ChatMessage;

/// Boxed future type for chat model calls.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A language model that answers a new message given prior context.
pub trait ChatModel: Send + Sync {
    /// Produce the assistant reply for `new_message`.
    ///
    /// `context` is the bounded window of earlier messages, oldest first.
    ///
    /// # Errors
    /// Returns an error if the backend call fails.
    fn invoke<'a>(
        &'a self,
        context: &'a [ChatMessage],
        new_message: &'a str,
    ) -> ChatFuture<'a, MemoryResult<String>>;

    /// Name of the backing model, for logs and responses.
    fn model_name(&self) -> &str;
}
