//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::llm::{ChatModel, OllamaChatModel};
use crate::memory::core::config::MemoryConfig;
use crate::memory::core::errors::MemoryResult;
use crate::memory::store::MemoryStore;
use crate::memory::{MemoryAssistant, MemoryProvider, open_store};

/// Shared application state.
pub struct AppState {
    /// Assistant answering chat requests.
    pub assistant: MemoryAssistant,
    /// Provider used for direct memory reads and deletes.
    pub provider: Arc<MemoryProvider>,
}

impl AppState {
    /// Build state from an already validated configuration: open the store
    /// and the Ollama model.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or the model client
    /// cannot be built.
    pub async fn new(config: &MemoryConfig) -> MemoryResult<Arc<Self>> {
        let store = open_store(&config.storage).await?;
        let model = Arc::new(OllamaChatModel::new(&config.llm)?);
        Ok(Self::from_parts(store, model, config))
    }

    /// Assemble state from an existing store and model.
    #[must_use]
    pub fn from_parts(
        store: Arc<dyn MemoryStore>,
        model: Arc<dyn ChatModel>,
        config: &MemoryConfig,
    ) -> Arc<Self> {
        let provider = Arc::new(MemoryProvider::new(store, config.window.clone()));
        let assistant = MemoryAssistant::new(Arc::clone(&provider), model);
        Arc::new(Self {
            assistant,
            provider,
        })
    }
}
