use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ToolCall;

/// A named event delivered by the chat endpoint's server-push response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// The agent invoked a tool; shown as a thinking step.
    Thinking(ToolCall),

    /// A tool execution report; informational only.
    ExecutionTool(Value),

    /// A fragment of the visible answer text.
    MessageChunk(String),

    /// The server finished the response.
    StreamEnd(StreamEnd),

    /// An event name this client does not know; ignored by the session.
    Other {
        /// The SSE `event:` name.
        name: String,
        /// The raw `data:` payload.
        data: String,
    },
}

impl ChatStreamEvent {
    /// The SSE event name this event was decoded from.
    pub fn name(&self) -> &str {
        match self {
            ChatStreamEvent::Thinking(_) => "thinking",
            ChatStreamEvent::ExecutionTool(_) => "execution_tool",
            ChatStreamEvent::MessageChunk(_) => "message_chunk",
            ChatStreamEvent::StreamEnd(_) => "stream_end",
            ChatStreamEvent::Other { name, .. } => name,
        }
    }

    /// Returns true for the terminating event.
    pub fn is_end(&self) -> bool {
        matches!(self, ChatStreamEvent::StreamEnd(_))
    }
}

/// Payload of the `stream_end` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamEnd {
    /// Whether the server considers the response complete.
    #[serde(default)]
    pub done: bool,

    /// Why the stream ended, if the server said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(ChatStreamEvent::MessageChunk("x".into()).name(), "message_chunk");
        assert_eq!(
            ChatStreamEvent::Thinking(ToolCall::named("t")).name(),
            "thinking"
        );
        assert!(ChatStreamEvent::StreamEnd(StreamEnd::default()).is_end());
    }

    #[test]
    fn serializes_for_logging() {
        let event = ChatStreamEvent::MessageChunk("Hel".into());
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"message_chunk","data":"Hel"}"#);
    }
}
