//! Terminal output for streaming chat turns.
//!
//! This module provides the [`Renderer`] trait that a chat session echoes
//! stream events to, and a plain-text implementation with optional ANSI
//! styling.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::types::ToolCall;

/// ANSI escape code for dim text (used for thinking steps).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for tool names).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for tool arguments).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for tool reports).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// Trait for rendering a streaming chat turn.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Print a chunk of the AI's answer.
    ///
    /// This is called incrementally as chunks are streamed from the service.
    fn print_text(&mut self, text: &str);

    /// Print a thinking step: a tool the agent invoked before answering.
    fn print_tool_call(&mut self, call: &ToolCall);

    /// Print a tool execution report.
    fn print_tool_execution(&mut self, report: &Value) {
        _ = report;
    }

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }

    /// Creates a new PlainTextRenderer with specified color and interrupt flag.
    pub fn with_color_and_interrupt(use_color: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self::with_color(use_color).with_interrupt(interrupted)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.line_start = text.ends_with('\n');
    }

    /// Starts a fresh line unless already at the start of one.
    fn break_line(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn print_tool_call(&mut self, call: &ToolCall) {
        self.break_line();
        let name = self.styled(ANSI_CYAN, &format!("[thinking: {}]", call.function_name));
        let line = if call.args.is_empty() {
            format!("{name}\n")
        } else {
            let args = Value::Object(call.args.clone()).to_string();
            format!("{name} {}\n", self.styled(ANSI_YELLOW, &args))
        };
        self.write(&line);
    }

    fn print_tool_execution(&mut self, report: &Value) {
        self.break_line();
        let line = self.styled(ANSI_MAGENTA, &format!("[tool report] {report}"));
        let line = self.styled(ANSI_DIM, &line);
        self.write(&format!("{line}\n"));
    }

    fn print_error(&mut self, error: &str) {
        self.break_line();
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        self.write(&format!("{line}\n"));
    }

    fn print_info(&mut self, info: &str) {
        self.break_line();
        self.write(&format!("{info}\n"));
    }

    fn finish_response(&mut self) {
        self.break_line();
    }

    fn print_interrupted(&mut self) {
        self.break_line();
        self.write("[interrupted]\n");
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn plain_turn() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let mut args = serde_json::Map::new();
        args.insert("query".into(), json!("shoes"));
        renderer.print_tool_call(&ToolCall::new("search_ads", args));
        renderer.print_text("Hel");
        renderer.print_text("lo");
        renderer.finish_response();
        assert_eq!(
            output(renderer),
            "[thinking: search_ads] {\"query\":\"shoes\"}\nHello\n"
        );
    }

    #[test]
    fn errors_start_on_a_new_line() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_text("partial");
        renderer.print_error("connection reset");
        assert_eq!(output(renderer), "partial\nError: connection reset\n");
    }

    #[test]
    fn color_wraps_tool_names() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.print_tool_call(&ToolCall::named("lookup"));
        assert_eq!(output(renderer), "\x1b[36m[thinking: lookup]\x1b[0m\n");
    }

    #[test]
    fn interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let renderer = PlainTextRenderer::with_writer(Vec::new(), false).with_interrupt(flag.clone());
        assert!(!renderer.should_interrupt());
        flag.store(true, Ordering::Relaxed);
        assert!(renderer.should_interrupt());
    }
}
