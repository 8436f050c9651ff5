//! Sliding-window memory provider.

pub mod window_provider;

pub use window_provider::{ConversationGuard, MemoryProvider, latest_window};
