// Public modules
pub mod chat;
pub mod classify;
pub mod client;
pub mod client_logger;
pub mod content;
pub mod error;
pub mod observability;
pub mod render;
pub mod rest;
pub mod services;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use chat::{ChatConfig, ChatSession, TurnOutcome};
pub use classify::classify;
pub use client::{AiClient, ChatBackend, ChatEventStream};
pub use client_logger::ClientLogger;
pub use content::{RenderOptions, render_html, render_message};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use rest::{MemoryTokenStore, RestClient, TokenStore, Tokens};
pub use services::{AuthService, ContentPlanService, WorkspaceService};
pub use types::*;
