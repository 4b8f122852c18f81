//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{AI_URL_ENV_VAR, DEFAULT_AGENT_ID, DEFAULT_TIMEOUT, TOKEN_ENV_VAR};

/// Greeting shown when a chat starts.
pub const DEFAULT_WELCOME: &str =
    "Hello! I'm Famarex. How can I help you optimize your Facebook ad campaigns?";

/// Command-line arguments for the famarex-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the AI service.
    #[arrrg(optional, "AI service URL (default: $FAMAREX_AI_URL or https://aiapi.superbai.io/api/v1)", "URL")]
    pub ai_url: Option<String>,

    /// Bearer token for the AI service.
    #[arrrg(optional, "Bearer token (default: $FAMAREX_AI_TOKEN)", "TOKEN")]
    pub token: Option<String>,

    /// Agent whose sessions `/history` lists.
    #[arrrg(optional, "Agent id (default: facebook_marketing_agent)", "AGENT")]
    pub agent: Option<String>,

    /// Identifier of the person chatting, sent as session metadata.
    #[arrrg(optional, "User id recorded on new sessions", "ID")]
    pub user_id: Option<String>,

    /// Display name of the person chatting, sent as session metadata.
    #[arrrg(optional, "User name recorded on new sessions", "NAME")]
    pub user_name: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// AI service base URL; `None` lets the client pick its default.
    pub ai_url: Option<String>,

    /// Bearer token; `None` lets the client read `FAMAREX_AI_TOKEN`.
    pub token: Option<String>,

    /// Agent whose sessions are listed by `history`.
    pub agent_id: String,

    /// Identifier of the person chatting.
    pub user_id: Option<String>,

    /// Display name of the person chatting.
    pub user_name: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Timeout for non-streaming requests and for connecting.
    pub timeout: Duration,

    /// Greeting placed at the top of every new chat.
    pub welcome: Option<String>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Agent: facebook_marketing_agent
    /// - Timeout: 60 seconds
    /// - Color: enabled
    /// - Welcome: the standard greeting
    pub fn new() -> Self {
        Self {
            ai_url: None,
            token: None,
            agent_id: DEFAULT_AGENT_ID.to_string(),
            user_id: None,
            user_name: None,
            use_color: true,
            timeout: DEFAULT_TIMEOUT,
            welcome: Some(DEFAULT_WELCOME.to_string()),
        }
    }

    /// Fills unset connection settings from `FAMAREX_AI_URL` and `FAMAREX_AI_TOKEN`.
    pub fn with_env_fallbacks(mut self) -> Self {
        if self.ai_url.is_none() {
            self.ai_url = std::env::var(AI_URL_ENV_VAR).ok();
        }
        if self.token.is_none() {
            self.token = std::env::var(TOKEN_ENV_VAR).ok();
        }
        self
    }

    /// Sets the AI service base URL.
    pub fn with_ai_url(mut self, url: impl Into<String>) -> Self {
        self.ai_url = Some(url.into());
        self
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the agent id.
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Sets the user recorded on new sessions.
    pub fn with_user(mut self, user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_name = Some(user_name.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets or clears the greeting.
    pub fn with_welcome(mut self, welcome: Option<String>) -> Self {
        self.welcome = welcome;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("ai_url", &self.ai_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("agent_id", &self.agent_id)
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("use_color", &self.use_color)
            .field("timeout", &self.timeout)
            .field("welcome", &self.welcome)
            .finish()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            ai_url: args.ai_url,
            token: args.token,
            agent_id: args.agent.unwrap_or(defaults.agent_id.clone()),
            user_id: args.user_id,
            user_name: args.user_name,
            use_color: !args.no_color,
            timeout: args
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}
