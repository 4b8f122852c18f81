//! Chat with a marketing agent over a streaming session.
//!
//! This module provides the conversation state machine and a session that
//! drives it against a [`ChatBackend`](crate::ChatBackend). It supports:
//!
//! - Streaming answers with thinking steps shown as they arrive
//! - Loading past sessions and listing agents
//! - Slash commands for session control
//! - Saving and loading transcripts
//!
//! # Architecture
//!
//! - [`conversation`]: messages, pending tool calls and turn state
//! - [`session`]: remote session management and stream consumption
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod conversation;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_WELCOME};
pub use conversation::{CloseReason, Conversation, Flow, TurnState};
pub use session::{ChatSession, SessionStats, TurnOutcome};
