//! Scripted chat models for tests.

use std::sync::Mutex;
use std::time::Duration;

use crate::llm::chat_model::{ChatFuture, ChatModel};
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::message::ChatMessage;

/// Replies `"echo: <message>"` and records every context it was given.
#[derive(Default)]
pub struct EchoModel {
    pub calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    pub delay: Option<Duration>,
}

impl EchoModel {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    pub fn recorded(&self) -> Vec<(Vec<ChatMessage>, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ChatModel for EchoModel {
    fn invoke<'a>(
        &'a self,
        context: &'a [ChatMessage],
        new_message: &'a str,
    ) -> ChatFuture<'a, MemoryResult<String>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((context.to_vec(), new_message.to_string()));
            }
            Ok(format!("echo: {new_message}"))
        })
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Always fails like an unreachable backend.
pub struct FailingModel;

impl ChatModel for FailingModel {
    fn invoke<'a>(
        &'a self,
        _context: &'a [ChatMessage],
        _new_message: &'a str,
    ) -> ChatFuture<'a, MemoryResult<String>> {
        Box::pin(async move { Err(MemoryError::Model("backend down".to_string())) })
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}
