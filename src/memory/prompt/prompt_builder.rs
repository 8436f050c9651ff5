//! Prompt builder for the conversation window.

use crate::memory::core::message::{ChatMessage, MessageRole};

/// Render the window and the new user message into one deterministic block.
///
/// System messages are hoisted into `[SYSTEM]` ahead of the transcript.
#[must_use]
pub fn build_conversation_prompt(context: &[ChatMessage], user_message: &str) -> String {
    let capacity = context.iter().map(|m| m.text().len() + 16).sum::<usize>() + user_message.len() + 64;
    let mut out = String::with_capacity(capacity);

    let system: Vec<&ChatMessage> = context
        .iter()
        .filter(|m| m.role() == MessageRole::System)
        .collect();
    if !system.is_empty() {
        out.push_str("[SYSTEM]\n");
        for message in system {
            out.push_str(message.text());
            out.push('\n');
        }
    }

    out.push_str("[CONVERSATION]\n");
    for message in context.iter().filter(|m| m.role() != MessageRole::System) {
        render_turn(&mut out, message);
    }

    out.push_str("[USER_MESSAGE]\n");
    out.push_str(user_message);
    out.push('\n');

    out
}

fn render_turn(out: &mut String, message: &ChatMessage) {
    let role = match message.role() {
        MessageRole::User => "User",
        MessageRole::Ai => "Assistant",
        MessageRole::System => "System",
    };
    out.push_str("- ");
    out.push_str(role);
    out.push_str(": ");
    out.push_str(message.text());
    out.push('\n');
}
