//! The message list of one chat and the state machine of its turns.
//!
//! A turn moves `Idle -> AwaitingConnection -> Streaming` and closes back to
//! `Idle`.  Only one turn can be open at a time; everything that mutates the
//! conversation goes through `&mut self`.

use crate::types::{ChatStreamEvent, Message, Sender, SessionEvent, ToolCall};

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn is open; a new message may be sent.
    Idle,
    /// The user message was accepted and the stream is being opened.
    AwaitingConnection,
    /// Events are arriving.
    Streaming,
}

/// Why a turn was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The server sent `stream_end`.
    StreamEnd(Option<String>),
    /// The response body ended without `stream_end`.
    ConnectionClosed,
    /// The user interrupted the turn.
    Interrupted,
    /// Opening or reading the stream failed.
    Error,
}

/// What applying an event means for the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// The event closed the turn.
    Finished,
}

/// Messages, pending tool calls and turn state of one chat.
#[derive(Debug, Clone)]
pub struct Conversation {
    session_id: Option<String>,
    messages: Vec<Message>,
    pending_tool_calls: Vec<ToolCall>,
    state: TurnState,
    /// Index of the AI message of the open turn, once its first chunk arrived.
    streaming: Option<usize>,
    /// Index of the AI message of the last closed turn.
    closed: Option<usize>,
    last_close: Option<CloseReason>,
    next_id: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// An empty conversation with no remote session.
    pub fn new() -> Self {
        Self {
            session_id: None,
            messages: Vec::new(),
            pending_tool_calls: Vec::new(),
            state: TurnState::Idle,
            streaming: None,
            closed: None,
            last_close: None,
            next_id: 1,
        }
    }

    /// A conversation opened by an AI greeting.
    pub fn with_welcome(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        let id = format!("welcome_{}", conversation.take_id());
        conversation.messages.push(Message::ai(id, text));
        conversation
    }

    /// Restores a saved message list.
    ///
    /// Messages are taken as complete.  New ids continue after the largest
    /// numeric id suffix already present.
    pub fn from_messages(session_id: Option<String>, mut messages: Vec<Message>) -> Self {
        for message in &mut messages {
            message.is_streaming = false;
        }
        let next_id = messages
            .iter()
            .filter_map(|m| m.id.rsplit('_').next()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self {
            session_id,
            messages,
            next_id,
            ..Self::new()
        }
    }

    /// Rebuilds a stored session.
    ///
    /// `events` come newest first, as the service returns them.  Text parts of
    /// an event are concatenated into one message; `function_call` parts are
    /// buffered and attached to the next AI message that has text.  Events
    /// whose content cannot be decoded are skipped.
    pub fn from_session_events(session_id: impl Into<String>, events: &[SessionEvent]) -> Self {
        let mut conversation = Self::new();
        conversation.session_id = Some(session_id.into());

        let mut pending: Vec<ToolCall> = Vec::new();
        for event in events.iter().rev() {
            let Ok(parts) = event.parts() else {
                continue;
            };
            let mut text = String::new();
            for part in parts {
                if let Some(fragment) = part.text {
                    text.push_str(&fragment);
                }
                if let Some(call) = part.function_call {
                    pending.push(call);
                }
            }
            if text.is_empty() {
                continue;
            }
            let message = if event.is_user() {
                Message::user(event.id.clone(), text)
            } else {
                Message::ai(event.id.clone(), text)
            };
            let mut message = message.with_timestamp(event.timestamp);
            if message.sender == Sender::Ai && !pending.is_empty() {
                message.thinking_steps = std::mem::take(&mut pending);
            }
            conversation.messages.push(message);
        }
        conversation
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn set_session_id(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Tool calls received but not yet attached to a message.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        &self.pending_tool_calls
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// True while a turn is open.
    pub fn is_busy(&self) -> bool {
        self.state != TurnState::Idle
    }

    /// The most recent AI message.
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_ai())
    }

    /// The AI message of the most recently closed turn.
    pub fn last_turn_message(&self) -> Option<&Message> {
        self.closed.and_then(|index| self.messages.get(index))
    }

    /// Why the most recent turn closed.
    pub fn last_close_reason(&self) -> Option<&CloseReason> {
        self.last_close.as_ref()
    }

    /// Opens a turn for `text`.
    ///
    /// Returns false, adding nothing, when the text is blank or another turn
    /// is open.
    pub fn begin_turn(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.state != TurnState::Idle {
            return false;
        }
        let id = format!("user_{}", self.take_id());
        self.messages.push(Message::user(id, text));
        self.pending_tool_calls.clear();
        self.streaming = None;
        self.closed = None;
        self.state = TurnState::AwaitingConnection;
        true
    }

    /// The stream of the open turn is connected.
    pub fn connection_opened(&mut self) {
        if self.state == TurnState::AwaitingConnection {
            self.state = TurnState::Streaming;
        }
    }

    /// Applies one stream event, in arrival order.
    ///
    /// Events are ignored unless a turn is open.
    pub fn apply(&mut self, event: &ChatStreamEvent) -> Flow {
        if self.state == TurnState::Idle {
            return Flow::Continue;
        }
        match event {
            ChatStreamEvent::Thinking(call) => {
                self.pending_tool_calls.push(call.clone());
            }
            ChatStreamEvent::MessageChunk(text) => self.append_chunk(text),
            ChatStreamEvent::StreamEnd(end) => {
                self.close(CloseReason::StreamEnd(end.reason.clone()));
                return Flow::Finished;
            }
            ChatStreamEvent::ExecutionTool(_) | ChatStreamEvent::Other { .. } => {}
        }
        Flow::Continue
    }

    fn append_chunk(&mut self, text: &str) {
        self.state = TurnState::Streaming;
        match self.streaming {
            Some(index) => self.messages[index].content.push_str(text),
            None => {
                let id = format!("ai_{}", self.take_id());
                let mut message = Message::ai(id, text)
                    .with_thinking_steps(std::mem::take(&mut self.pending_tool_calls));
                message.is_streaming = true;
                self.messages.push(message);
                self.streaming = Some(self.messages.len() - 1);
            }
        }
    }

    /// Closes the open turn, keeping whatever content arrived.
    ///
    /// Returns the AI message of the turn, if one was started.
    pub fn close(&mut self, reason: CloseReason) -> Option<&Message> {
        self.last_close = Some(reason);
        self.state = TurnState::Idle;
        let index = self.streaming.take()?;
        self.closed = Some(index);
        let message = &mut self.messages[index];
        message.is_streaming = false;
        Some(message)
    }

    /// Forgets all messages and the remote session.
    pub fn reset(&mut self) {
        *self = Self {
            next_id: self.next_id,
            ..Self::new()
        };
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamEnd;

    fn chunk(text: &str) -> ChatStreamEvent {
        ChatStreamEvent::MessageChunk(text.to_string())
    }

    fn end() -> ChatStreamEvent {
        ChatStreamEvent::StreamEnd(StreamEnd::default())
    }

    #[test]
    fn blank_messages_are_rejected() {
        let mut conversation = Conversation::new();
        assert!(!conversation.begin_turn("   \n"));
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.state(), TurnState::Idle);
    }

    #[test]
    fn one_turn_at_a_time() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_turn("first"));
        assert!(!conversation.begin_turn("second"));
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.state(), TurnState::AwaitingConnection);
    }

    #[test]
    fn chunks_grow_one_message() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("hi");
        conversation.connection_opened();
        conversation.apply(&ChatStreamEvent::Thinking(ToolCall::named("toolA")));
        conversation.apply(&chunk("Hel"));
        let streaming = conversation.last_ai_message().unwrap();
        assert!(streaming.is_streaming);
        conversation.apply(&chunk("lo"));
        assert_eq!(conversation.apply(&end()), Flow::Finished);

        assert_eq!(conversation.messages().len(), 2);
        let ai = conversation.last_ai_message().unwrap();
        assert_eq!(ai.content, "Hello");
        assert_eq!(ai.thinking_steps, vec![ToolCall::named("toolA")]);
        assert!(!ai.is_streaming);
        assert_eq!(conversation.state(), TurnState::Idle);
        assert!(conversation.pending_tool_calls().is_empty());
        assert_eq!(
            conversation.last_close_reason(),
            Some(&CloseReason::StreamEnd(None))
        );
        assert_eq!(conversation.last_turn_message().unwrap().content, "Hello");
    }

    #[test]
    fn late_tool_calls_stay_pending() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("hi");
        conversation.connection_opened();
        conversation.apply(&chunk("a"));
        conversation.apply(&ChatStreamEvent::Thinking(ToolCall::named("late")));
        conversation.apply(&chunk("b"));
        let ai = conversation.last_ai_message().unwrap();
        assert_eq!(ai.content, "ab");
        assert!(ai.thinking_steps.is_empty());
        assert_eq!(conversation.pending_tool_calls(), &[ToolCall::named("late")]);

        conversation.close(CloseReason::ConnectionClosed);
        assert!(conversation.begin_turn("again"));
        assert!(conversation.pending_tool_calls().is_empty());
    }

    #[test]
    fn close_keeps_partial_content() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("hi");
        conversation.connection_opened();
        conversation.apply(&chunk("partial"));
        let closed = conversation.close(CloseReason::Error).unwrap();
        assert_eq!(closed.content, "partial");
        assert!(!closed.is_streaming);
        assert!(!conversation.is_busy());
    }

    #[test]
    fn close_without_chunks_returns_nothing() {
        let mut conversation = Conversation::new();
        conversation.begin_turn("hi");
        assert!(conversation.close(CloseReason::Interrupted).is_none());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn events_outside_a_turn_are_ignored() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.apply(&chunk("stray")), Flow::Continue);
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn ids_are_unique_across_turns() {
        let mut conversation = Conversation::new();
        for _ in 0..2 {
            conversation.begin_turn("q");
            conversation.apply(&chunk("a"));
            conversation.apply(&end());
        }
        let ids: Vec<&str> = conversation.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["user_1", "ai_2", "user_3", "ai_4"]);
    }

    #[test]
    fn reset_forgets_session() {
        let mut conversation = Conversation::with_welcome("Hello!");
        conversation.set_session_id(Some("s1".into()));
        conversation.reset();
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.session_id(), None);
    }

    #[test]
    fn stored_events_are_replayed_oldest_first() {
        let json = r#"[
            {"id":"e3","author":"agent","timestamp":3,
             "content":"{\"parts\":[{\"text\":\"Here are \"},{\"text\":\"the results\"}]}"},
            {"id":"e2","author":"agent","timestamp":2,
             "content":"{\"parts\":[{\"function_call\":{\"name\":\"search_ads\",\"args\":{\"q\":\"x\"}}},{\"function_response\":{}}]}"},
            {"id":"bad","author":"agent","timestamp":2,"content":"not json"},
            {"id":"e1","author":"user","timestamp":1,
             "content":"{\"parts\":[{\"text\":\"find ads\"}]}"}
        ]"#;
        let events: Vec<SessionEvent> = serde_json::from_str(json).unwrap();
        let conversation = Conversation::from_session_events("s1", &events);

        assert_eq!(conversation.session_id(), Some("s1"));
        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "e1");
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].content, "Here are the results");
        assert_eq!(messages[1].thinking_steps[0].function_name, "search_ads");
        assert_eq!(conversation.state(), TurnState::Idle);
    }

    #[test]
    fn restored_messages_continue_ids() {
        let mut streaming = Message::ai("ai_4", "partial");
        streaming.is_streaming = true;
        let messages = vec![Message::user("user_3", "hi"), streaming];
        let mut conversation = Conversation::from_messages(Some("s9".into()), messages);
        assert!(!conversation.messages()[1].is_streaming);
        assert!(conversation.begin_turn("again"));
        assert_eq!(conversation.messages()[2].id, "user_5");
    }

    #[test]
    fn restored_id_at_limit_does_not_overflow() {
        let messages = vec![Message::ai("ai_18446744073709551615", "done")];
        let mut conversation = Conversation::from_messages(None, messages);
        assert!(conversation.begin_turn("next"));
        assert_eq!(conversation.messages()[1].id, "user_18446744073709551615");
    }
}
