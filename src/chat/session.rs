//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns a
//! [`Conversation`], creates the remote session on first use and drives the
//! streaming response of each turn into a [`Renderer`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_reader, to_writer_pretty};

use crate::Error;
use crate::chat::config::ChatConfig;
use crate::chat::conversation::{CloseReason, Conversation, Flow};
use crate::classify::classify;
use crate::client::ChatBackend;
use crate::content::{RenderOptions, render_html};
use crate::error::Result;
use crate::observability::{CHAT_TOOL_CALLS, CHAT_TURNS, CHAT_TURNS_IGNORED, CHAT_TURNS_INTERRUPTED};
use crate::render::Renderer;
use crate::types::{
    AgentsResponse, ChatHistoryResponse, ChatRequestBody, ChatStreamEvent, ContentType, Message,
    SessionCreateRequest,
};

/// How often a quiet stream is checked for a user interrupt.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// How a call to [`ChatSession::send_streaming`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The text was blank or another turn was open; nothing was sent.
    Ignored,
    /// The turn ran and closed.
    Completed {
        /// The AI message of the turn, if any chunk arrived.
        message_id: Option<String>,
        /// Why the stream closed.
        reason: CloseReason,
    },
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The agent whose sessions `history` lists.
    pub agent_id: String,
    /// The remote session, once created or loaded.
    pub session_id: Option<String>,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Messages written by the user.
    pub user_messages: usize,
    /// Messages written by the AI, including the greeting.
    pub ai_messages: usize,
    /// Thinking steps attached to AI messages.
    pub tool_calls: usize,
    /// Turns sent by this session.
    pub turns: u64,
    /// Turns the user interrupted.
    pub interrupted_turns: u64,
}

/// A chat session that manages conversation state and service interactions.
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    config: ChatConfig,
    conversation: Conversation,
    turns: u64,
    interrupted_turns: u64,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Creates a new chat session; the remote session is created lazily.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let conversation = fresh_conversation(&config);
        Self {
            backend,
            config,
            conversation,
            turns: 0,
            interrupted_turns: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.conversation.session_id()
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.conversation.messages().len()
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to the conversation
    /// 2. Creates the remote session if there is none yet
    /// 3. Opens the chat stream and echoes events to the renderer
    /// 4. Closes the turn on `stream_end`, end of body, interrupt or error
    ///
    /// Blank text, or text sent while a turn is open, is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created, the stream cannot
    /// be opened or the stream fails.  The turn is closed either way and any
    /// partial answer is kept.
    pub async fn send_streaming(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        if !self.conversation.begin_turn(text) {
            CHAT_TURNS_IGNORED.click();
            return Ok(TurnOutcome::Ignored);
        }
        CHAT_TURNS.click();
        self.turns += 1;

        let mut stream = match self.open_stream(text).await {
            Ok(stream) => stream,
            Err(err) => {
                self.conversation.close(CloseReason::Error);
                renderer.print_error(&err.to_string());
                return Err(err);
            }
        };
        self.conversation.connection_opened();

        let reason = loop {
            if renderer.should_interrupt() {
                renderer.print_interrupted();
                break Some(CloseReason::Interrupted);
            }
            let next = match tokio::time::timeout(INTERRUPT_POLL, stream.next()).await {
                Ok(next) => next,
                Err(_) => continue,
            };
            match next {
                Some(Ok(event)) => {
                    echo(renderer, &event);
                    if self.conversation.apply(&event) == Flow::Finished {
                        break None;
                    }
                }
                Some(Err(err)) => {
                    self.conversation.close(CloseReason::Error);
                    renderer.finish_response();
                    renderer.print_error(&err.to_string());
                    return Err(err);
                }
                None => break Some(CloseReason::ConnectionClosed),
            }
        };
        drop(stream);
        if let Some(reason) = reason {
            self.conversation.close(reason);
        }
        renderer.finish_response();

        let reason = self
            .conversation
            .last_close_reason()
            .cloned()
            .unwrap_or(CloseReason::ConnectionClosed);
        if reason == CloseReason::Interrupted {
            CHAT_TURNS_INTERRUPTED.click();
            self.interrupted_turns += 1;
        }
        let message = self.conversation.last_turn_message();
        if let Some(message) = message {
            self.backend.log_message(message);
        }
        Ok(TurnOutcome::Completed {
            message_id: message.map(|m| m.id.clone()),
            reason,
        })
    }

    async fn open_stream(&mut self, text: &str) -> Result<crate::client::ChatEventStream> {
        let session_id = self.ensure_session().await?;
        self.backend
            .open_chat_stream(&session_id, &ChatRequestBody::new(text))
            .await
    }

    async fn ensure_session(&mut self) -> Result<String> {
        if let Some(id) = self.conversation.session_id() {
            return Ok(id.to_string());
        }
        let created = self
            .backend
            .create_session(&SessionCreateRequest {
                metadata: self.session_metadata(),
            })
            .await?;
        self.conversation
            .set_session_id(Some(created.session_id.clone()));
        Ok(created.session_id)
    }

    fn session_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Some(user_id) = &self.config.user_id {
            metadata.insert("user_id".into(), Value::String(user_id.clone()));
        }
        if let Some(user_name) = &self.config.user_name {
            metadata.insert("user_name".into(), Value::String(user_name.clone()));
        }
        metadata
    }

    /// Starts over with an empty conversation and no remote session.
    ///
    /// Ignored while a turn is open.
    pub fn new_chat(&mut self) -> bool {
        if self.conversation.is_busy() {
            return false;
        }
        self.conversation = fresh_conversation(&self.config);
        true
    }

    /// Replaces the conversation with a stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if a turn is open or the events cannot be fetched;
    /// the current conversation is kept.
    pub async fn load_session(&mut self, session_id: &str) -> Result<()> {
        if self.conversation.is_busy() {
            return Err(Error::bad_request(
                "cannot load a session while a response is streaming",
            ));
        }
        let events = self.backend.session_events(session_id).await?;
        self.conversation = Conversation::from_session_events(session_id, &events.events);
        Ok(())
    }

    /// Lists past sessions of the configured agent.
    pub async fn history(&self) -> Result<ChatHistoryResponse> {
        self.backend.agent_sessions(&self.config.agent_id).await
    }

    /// Lists the agents offered by the service.
    pub async fn agents(&self) -> Result<AgentsResponse> {
        self.backend.agents().await
    }

    /// The most recent AI message.
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.conversation.last_ai_message()
    }

    /// The content type of the most recent AI message.
    pub fn last_content_type(&self) -> Option<ContentType> {
        self.last_ai_message()
            .map(|message| classify(&message.content).content_type())
    }

    /// Renders the most recent AI message as an HTML fragment.
    pub fn render_last(&self, options: &RenderOptions) -> Option<String> {
        self.last_ai_message()
            .map(|message| render_html(&classify(&message.content), options))
    }

    /// Saves the conversation to a JSON transcript file.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.conversation);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to write transcript", Some(Box::new(err)))
        })
    }

    /// Loads a conversation from a JSON transcript file.
    ///
    /// # Errors
    ///
    /// Returns an error if a turn is open or the file cannot be read.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.conversation.is_busy() {
            return Err(Error::bad_request(
                "cannot load a transcript while a response is streaming",
            ));
        }
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(Error::validation(
                format!("unsupported transcript version {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        self.conversation = Conversation::from_messages(transcript.session_id, transcript.messages);
        Ok(())
    }

    /// Returns the current session statistics.
    pub fn stats(&self) -> SessionStats {
        let messages = self.conversation.messages();
        SessionStats {
            agent_id: self.config.agent_id.clone(),
            session_id: self.conversation.session_id().map(str::to_string),
            message_count: messages.len(),
            user_messages: messages.iter().filter(|m| !m.is_ai()).count(),
            ai_messages: messages.iter().filter(|m| m.is_ai()).count(),
            tool_calls: messages.iter().map(|m| m.thinking_steps.len()).sum(),
            turns: self.turns,
            interrupted_turns: self.interrupted_turns,
        }
    }
}

fn fresh_conversation(config: &ChatConfig) -> Conversation {
    match &config.welcome {
        Some(welcome) => Conversation::with_welcome(welcome.clone()),
        None => Conversation::new(),
    }
}

fn echo(renderer: &mut dyn Renderer, event: &ChatStreamEvent) {
    match event {
        ChatStreamEvent::Thinking(call) => {
            CHAT_TOOL_CALLS.click();
            renderer.print_tool_call(call);
        }
        ChatStreamEvent::ExecutionTool(report) => renderer.print_tool_execution(report),
        ChatStreamEvent::MessageChunk(text) => renderer.print_text(text),
        ChatStreamEvent::StreamEnd(_) | ChatStreamEvent::Other { .. } => {}
    }
}

const TRANSCRIPT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    #[serde(default)]
    session_id: Option<String>,
    messages: Vec<Message>,
}

impl TranscriptFile {
    fn new(conversation: &Conversation) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            session_id: conversation.session_id().map(str::to_string),
            messages: conversation.messages().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use futures::stream;

    use super::*;
    use crate::client::ChatEventStream;
    use crate::render::PlainTextRenderer;
    use crate::types::{
        Agent, SessionCreateResponse, SessionEvent, SessionEventsResponse, StreamEnd, ToolCall,
    };

    #[derive(Default)]
    struct Scripted {
        streams: Mutex<VecDeque<Vec<Result<ChatStreamEvent>>>>,
        created: Mutex<Vec<SessionCreateRequest>>,
        sent: Mutex<Vec<(String, String)>>,
        logged: Mutex<Vec<String>>,
        fail_create: bool,
    }

    impl Scripted {
        fn with_stream(self, events: Vec<Result<ChatStreamEvent>>) -> Self {
            self.streams.lock().unwrap().push_back(events);
            self
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for Scripted {
        async fn create_session(
            &self,
            request: &SessionCreateRequest,
        ) -> Result<SessionCreateResponse> {
            if self.fail_create {
                return Err(Error::service_unavailable("down", None));
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(SessionCreateResponse {
                session_id: "s-1".into(),
                status: Some("created".into()),
                created_at: None,
            })
        }

        async fn open_chat_stream(
            &self,
            session_id: &str,
            request: &ChatRequestBody,
        ) -> Result<ChatEventStream> {
            self.sent
                .lock()
                .unwrap()
                .push((session_id.to_string(), request.message.clone()));
            let events = self.streams.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Box::pin(stream::iter(events)))
        }

        async fn session_events(&self, _session_id: &str) -> Result<SessionEventsResponse> {
            let events: Vec<SessionEvent> = serde_json::from_str(
                r#"[{"id":"e2","author":"agent","timestamp":2,"content":"{\"parts\":[{\"text\":\"old answer\"}]}"},
                    {"id":"e1","author":"user","timestamp":1,"content":"{\"parts\":[{\"text\":\"old question\"}]}"}]"#,
            )
            .unwrap();
            Ok(SessionEventsResponse { events })
        }

        async fn agent_sessions(&self, agent_id: &str) -> Result<ChatHistoryResponse> {
            Err(Error::not_found(format!("no sessions for {agent_id}"), None, None))
        }

        async fn agents(&self) -> Result<AgentsResponse> {
            Ok(AgentsResponse {
                agents: vec![Agent {
                    id: "facebook_marketing_agent".into(),
                    name: "FB".into(),
                    description: String::new(),
                    avatar: None,
                    capabilities: Vec::new(),
                    status: None,
                }],
                total_count: 1,
            })
        }

        fn log_message(&self, message: &Message) {
            self.logged.lock().unwrap().push(message.id.clone());
        }
    }

    fn chunk(text: &str) -> Result<ChatStreamEvent> {
        Ok(ChatStreamEvent::MessageChunk(text.to_string()))
    }

    fn end() -> Result<ChatStreamEvent> {
        Ok(ChatStreamEvent::StreamEnd(StreamEnd {
            done: true,
            reason: None,
        }))
    }

    fn quiet_config() -> ChatConfig {
        ChatConfig::new().without_color().with_welcome(None)
    }

    fn renderer() -> PlainTextRenderer<Vec<u8>> {
        PlainTextRenderer::with_writer(Vec::new(), false)
    }

    #[tokio::test]
    async fn streamed_turn_builds_one_message() {
        let backend = Scripted::default().with_stream(vec![
            Ok(ChatStreamEvent::Thinking(ToolCall::named("toolA"))),
            chunk("Hel"),
            chunk("lo"),
            end(),
        ]);
        let mut session = ChatSession::new(backend, quiet_config().with_user("u1", "Lan"));
        let mut out = renderer();

        let outcome = session.send_streaming("hi", &mut out).await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                message_id: Some("ai_2".into()),
                reason: CloseReason::StreamEnd(None),
            }
        );
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[1].thinking_steps, vec![ToolCall::named("toolA")]);
        assert!(!messages[1].is_streaming);
        assert_eq!(session.session_id(), Some("s-1"));

        let created = session.backend().created.lock().unwrap().clone();
        assert_eq!(created[0].metadata["user_name"], "Lan");
        assert_eq!(
            session.backend().sent.lock().unwrap()[0],
            ("s-1".to_string(), "hi".to_string())
        );
        assert_eq!(*session.backend().logged.lock().unwrap(), vec!["ai_2".to_string()]);
        let printed = String::from_utf8(out.into_inner()).unwrap();
        assert!(printed.contains("toolA"));
        assert!(printed.contains("Hello"));
    }

    #[tokio::test]
    async fn session_is_created_once() {
        let backend = Scripted::default()
            .with_stream(vec![chunk("a"), end()])
            .with_stream(vec![chunk("b"), end()]);
        let mut session = ChatSession::new(backend, quiet_config());
        session.send_streaming("one", &mut renderer()).await.unwrap();
        session.send_streaming("two", &mut renderer()).await.unwrap();
        assert_eq!(session.backend().created.lock().unwrap().len(), 1);
        assert_eq!(session.message_count(), 4);
    }

    #[tokio::test]
    async fn blank_text_is_ignored() {
        let mut session = ChatSession::new(Scripted::default(), quiet_config());
        let outcome = session.send_streaming("   ", &mut renderer()).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(session.message_count(), 0);
        assert!(session.backend().created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn body_ending_without_stream_end_keeps_partial_text() {
        let backend = Scripted::default().with_stream(vec![chunk("partial")]);
        let mut session = ChatSession::new(backend, quiet_config());
        let outcome = session.send_streaming("hi", &mut renderer()).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Completed {
                reason: CloseReason::ConnectionClosed,
                ..
            }
        ));
        assert_eq!(session.last_ai_message().unwrap().content, "partial");
        assert!(!session.conversation().is_busy());
    }

    #[tokio::test]
    async fn stream_error_closes_the_turn() {
        let backend = Scripted::default().with_stream(vec![
            chunk("half"),
            Err(Error::api(500, Some("stream_error".into()), "boom")),
        ]);
        let mut session = ChatSession::new(backend, quiet_config());
        let err = session.send_streaming("hi", &mut renderer()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(!session.conversation().is_busy());
        assert_eq!(session.last_ai_message().unwrap().content, "half");
        assert_eq!(
            session.conversation().last_close_reason(),
            Some(&CloseReason::Error)
        );
    }

    #[tokio::test]
    async fn failed_session_create_returns_to_idle() {
        let backend = Scripted {
            fail_create: true,
            ..Scripted::default()
        };
        let mut session = ChatSession::new(backend, quiet_config());
        assert!(session.send_streaming("hi", &mut renderer()).await.is_err());
        assert!(!session.conversation().is_busy());
        assert_eq!(session.session_id(), None);
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn interrupt_stops_reading() {
        let backend = Scripted::default().with_stream(vec![chunk("never"), end()]);
        let flag = Arc::new(AtomicBool::new(true));
        let mut out = renderer().with_interrupt(flag.clone());
        let mut session = ChatSession::new(backend, quiet_config());
        let outcome = session.send_streaming("hi", &mut out).await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                message_id: None,
                reason: CloseReason::Interrupted,
            }
        );
        assert!(flag.load(Ordering::Relaxed));
        assert_eq!(session.stats().interrupted_turns, 1);
    }

    #[tokio::test]
    async fn load_session_replaces_conversation() {
        let mut session = ChatSession::new(Scripted::default(), ChatConfig::new());
        assert_eq!(session.message_count(), 1);
        session.load_session("old").await.unwrap();
        assert_eq!(session.session_id(), Some("old"));
        let contents: Vec<_> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["old question", "old answer"]);
    }

    #[tokio::test]
    async fn history_errors_surface() {
        let session = ChatSession::new(Scripted::default(), quiet_config());
        assert!(session.history().await.unwrap_err().is_not_found());
        assert_eq!(session.agents().await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn new_chat_restores_welcome() {
        let backend = Scripted::default().with_stream(vec![chunk("x"), end()]);
        let mut session = ChatSession::new(backend, ChatConfig::new());
        session.send_streaming("hi", &mut renderer()).await.unwrap();
        assert_eq!(session.message_count(), 3);
        assert!(session.new_chat());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.session_id(), None);
        assert!(session.messages()[0].is_ai());
    }

    #[tokio::test]
    async fn render_last_classifies() {
        let backend = Scripted::default().with_stream(vec![chunk("# Report"), end()]);
        let mut session = ChatSession::new(backend, quiet_config());
        assert!(session.render_last(&RenderOptions::default()).is_none());
        session.send_streaming("hi", &mut renderer()).await.unwrap();
        assert_eq!(session.last_content_type(), Some(ContentType::Markdown));
        let html = session.render_last(&RenderOptions::default()).unwrap();
        assert!(html.contains("<h1>"));
    }

    #[tokio::test]
    async fn transcript_round_trip() {
        let backend = Scripted::default().with_stream(vec![chunk("saved"), end()]);
        let mut session = ChatSession::new(backend, quiet_config());
        session.send_streaming("keep this", &mut renderer()).await.unwrap();

        let path = std::env::temp_dir().join(format!(
            "famarex-transcript-{}.json",
            std::process::id()
        ));
        session.save_transcript_to(&path).unwrap();

        let mut restored = ChatSession::new(Scripted::default(), quiet_config());
        restored.load_transcript_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored.session_id(), Some("s-1"));
        assert_eq!(restored.messages(), session.messages());
    }

    #[test]
    fn stats_count_messages() {
        let session = ChatSession::new(Scripted::default(), ChatConfig::new());
        let stats = session.stats();
        assert_eq!(stats.agent_id, "facebook_marketing_agent");
        assert_eq!(stats.message_count, 1);
        assert_eq!(stats.ai_messages, 1);
        assert_eq!(stats.turns, 0);
    }
}
