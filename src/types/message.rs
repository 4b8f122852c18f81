use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ToolCall;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the chat.
    User,
    /// The AI agent.
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

/// A single message in a conversation.
///
/// AI messages are created by the first streamed chunk of a response and grow
/// in place while `is_streaming` is set.  Once the stream closes the message
/// is no longer modified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Identifier unique within the conversation.
    pub id: String,

    /// Message text as received; classified only when rendered.
    pub content: String,

    /// Author of the message.
    pub sender: Sender,

    /// Creation time.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,

    /// Tool calls that preceded this message's text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thinking_steps: Vec<ToolCall>,

    /// True while chunks are still being appended.
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    /// Creates a completed user message.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender: Sender::User,
            timestamp: OffsetDateTime::now_utc(),
            thinking_steps: Vec::new(),
            is_streaming: false,
        }
    }

    /// Creates a completed AI message.
    pub fn ai(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            ..Self::user(id, content)
        }
    }

    /// Sets the thinking steps shown above the message.
    pub fn with_thinking_steps(mut self, steps: Vec<ToolCall>) -> Self {
        self.thinking_steps = steps;
        self
    }

    /// Sets the creation time.
    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns true if the AI authored this message.
    pub fn is_ai(&self) -> bool {
        self.sender == Sender::Ai
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_omits_empty_steps() {
        let message = Message::user("user_1", "hello")
            .with_timestamp(OffsetDateTime::from_unix_timestamp(0).unwrap());
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"{"id":"user_1","content":"hello","sender":"user","timestamp":"1970-01-01T00:00:00Z","is_streaming":false}"#
        );
    }

    #[test]
    fn ai_constructor() {
        let message = Message::ai("ai_1", "hi").with_thinking_steps(vec![ToolCall::named("a")]);
        assert!(message.is_ai());
        assert_eq!(message.thinking_steps.len(), 1);
    }
}
