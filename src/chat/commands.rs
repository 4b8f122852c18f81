//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the agent.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new chat with no remote session.
    New,

    /// List past sessions of the agent.
    History,

    /// Load a stored session by id.
    Load(String),

    /// List the agents offered by the service.
    Agents,

    /// Print the HTML rendering of the last AI message.
    Render,

    /// Print the content type of the last AI message.
    Type,

    /// Save the transcript to a specific file immediately.
    Save(String),

    /// Load conversation history from a transcript file.
    Open(String),

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use famarex::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/load 5f2c").is_some());
/// assert!(parse_command("How are my ads doing?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "clear" => ChatCommand::New,
        "history" | "sessions" => ChatCommand::History,
        "load" => required(argument, ChatCommand::Load, "/load requires a session id"),
        "agents" => ChatCommand::Agents,
        "render" | "html" => ChatCommand::Render,
        "type" => ChatCommand::Type,
        "save" => required(argument, ChatCommand::Save, "/save requires a file path"),
        "open" => required(argument, ChatCommand::Open, "/open requires a file path"),
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn required<F>(argument: Option<&str>, constructor: F, missing: &str) -> ChatCommand
where
    F: Fn(String) -> ChatCommand,
{
    match argument {
        Some(arg) => constructor(arg.to_string()),
        None => ChatCommand::Invalid(missing.to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat
  /history               List past sessions of the agent
  /load <session-id>     Load a past session
  /agents                List available agents
  /render                Print the last answer as HTML
  /type                  Show the content type of the last answer
  /save <file>           Save the current transcript
  /open <file>           Load a transcript from disk
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_new() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::New));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::New));
    }

    #[test]
    fn parse_load() {
        assert_eq!(
            parse_command("/load   abc-123  "),
            Some(ChatCommand::Load("abc-123".to_string()))
        );
        assert_eq!(
            parse_command("/load"),
            Some(ChatCommand::Invalid(
                "/load requires a session id".to_string()
            ))
        );
    }

    #[test]
    fn parse_transcript_commands() {
        assert_eq!(
            parse_command("/save session.json"),
            Some(ChatCommand::Save("session.json".to_string()))
        );
        assert_eq!(
            parse_command("/open session.json"),
            Some(ChatCommand::Open("session.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_views() {
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/agents"), Some(ChatCommand::Agents));
        assert_eq!(parse_command("/render"), Some(ChatCommand::Render));
        assert_eq!(parse_command("/type"), Some(ChatCommand::Type));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model x"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("a/b"), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        for command in ["/new", "/history", "/load", "/render", "/save", "/quit"] {
            assert!(help.contains(command), "{command}");
        }
    }
}
