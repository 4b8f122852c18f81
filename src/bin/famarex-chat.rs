//! Interactive chat with a Famarex marketing agent.
//!
//! This binary provides a streaming REPL for chatting with an agent of the
//! AI service.  Thinking steps are printed as the agent invokes tools and
//! the answer streams in as it is written.
//!
//! # Usage
//!
//! ```bash
//! # Token from FAMAREX_AI_TOKEN, default service and agent
//! famarex-chat
//!
//! # Point at another deployment and record who is chatting
//! famarex-chat --ai-url http://localhost:8000/api/v1 --user-id 42 --user-name Lan
//!
//! # Disable colors (useful for piping output)
//! famarex-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new chat
//! - `/history` - List past sessions
//! - `/load <id>` - Load a past session
//! - `/render` - Print the last answer as HTML
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use famarex::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use famarex::{AiClient, Message, RenderOptions};

/// Main entry point for the famarex-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("famarex-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = AiClient::with_options(
        config.token.clone(),
        config.ai_url.clone(),
        Some(config.timeout),
    )?;
    let base_url = client.base_url().to_string();
    let mut session = ChatSession::new(client, config);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut renderer = PlainTextRenderer::with_color_and_interrupt(use_color, interrupted.clone());
    let mut rl = DefaultEditor::new()?;

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!(
        "Famarex Chat (agent: {}, service: {})",
        session.config().agent_id,
        base_url
    );
    println!("Type /help for commands, /quit to exit\n");
    print_messages(session.messages());

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::New => {
                            session.new_chat();
                            renderer.print_info("Started a new chat.");
                            print_messages(session.messages());
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => match session.history().await {
                            Ok(history) if history.sessions.is_empty() => {
                                renderer.print_info("No past sessions.")
                            }
                            Ok(history) => {
                                for summary in history.sessions {
                                    let title = summary
                                        .title
                                        .or(summary.last_message)
                                        .unwrap_or_default();
                                    println!("    {}  {}", summary.session_id, title);
                                }
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to list sessions: {}", err)),
                        },
                        ChatCommand::Load(id) => match session.load_session(&id).await {
                            Ok(()) => {
                                renderer.print_info(&format!("Loaded session {}", id));
                                print_messages(session.messages());
                            }
                            Err(err) => {
                                renderer.print_error(&format!("Failed to load session: {}", err))
                            }
                        },
                        ChatCommand::Agents => match session.agents().await {
                            Ok(agents) => {
                                for agent in agents.agents {
                                    println!("    {}  {}", agent.id, agent.name);
                                }
                            }
                            Err(err) => {
                                renderer.print_error(&format!("Failed to list agents: {}", err))
                            }
                        },
                        ChatCommand::Render => {
                            match session.render_last(&RenderOptions::default()) {
                                Some(html) => println!("{}", html),
                                None => renderer.print_info("No answer to render yet."),
                            }
                        }
                        ChatCommand::Type => match session.last_content_type() {
                            Some(content_type) => renderer.print_info(content_type.as_str()),
                            None => renderer.print_info("No answer yet."),
                        },
                        ChatCommand::Save(path) => match session.save_transcript_to(&path) {
                            Ok(_) => renderer.print_info(&format!("Transcript saved to {}", path)),
                            Err(err) => renderer
                                .print_error(&format!("Failed to save transcript: {}", err)),
                        },
                        ChatCommand::Open(path) => match session.load_transcript_from(&path) {
                            Ok(_) => {
                                renderer.print_info(&format!("Transcript loaded from {}", path));
                                print_messages(session.messages());
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to load transcript: {}", err)),
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the agent
                println!("Famarex:");
                // The session already reported the failure to the renderer.
                let _ = session.send_streaming(line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        let who = if message.is_ai() { "Famarex" } else { "You" };
        for step in &message.thinking_steps {
            println!("  [thinking: {}]", step.function_name);
        }
        println!("{}: {}", who, message.content);
    }
    if !messages.is_empty() {
        println!();
    }
}

fn print_stats(session: &ChatSession<AiClient>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Agent: {}", stats.agent_id);
    println!(
        "      Session: {}",
        stats.session_id.as_deref().unwrap_or("(not created yet)")
    );
    println!(
        "      Messages: {} ({} from you, {} from the agent)",
        stats.message_count, stats.user_messages, stats.ai_messages
    );
    println!("      Thinking steps: {}", stats.tool_calls);
    println!(
        "      Turns: {} ({} interrupted)",
        stats.turns, stats.interrupted_turns
    );
}
