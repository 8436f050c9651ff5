//! Assistant with per-conversation memory.

pub mod memory_assistant;

pub use memory_assistant::MemoryAssistant;
