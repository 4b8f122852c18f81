//! Logging hook for chat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! the traffic passing through an [`AiClient`](crate::AiClient).

use crate::types::{ChatStreamEvent, Message};

/// A trait for logging chat client operations.
///
/// Install an implementation with [`AiClient::with_logger`](crate::AiClient::with_logger)
/// to record every decoded stream event and every completed AI message.
///
/// # Example
///
/// ```rust,ignore
/// use famarex::{ChatStreamEvent, ClientLogger, Message};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_stream_event(&self, event: &ChatStreamEvent) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "event: {}", serde_json::to_string(event).unwrap()).unwrap();
///     }
///
///     fn log_message(&self, message: &Message) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "message: {}", serde_json::to_string(message).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an individual streaming event, in arrival order.
    fn log_stream_event(&self, event: &ChatStreamEvent);

    /// Log an AI message once its stream has closed.
    ///
    /// Called with whatever content was received, including the partial
    /// content of an interrupted or failed turn.
    fn log_message(&self, message: &Message);
}
