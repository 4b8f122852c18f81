//! Server-Sent Events (SSE) processing for the chat endpoint.
//!
//! The chat endpoint answers with a long-lived `text/event-stream` response.
//! This module turns its byte stream into a stream of [`ChatStreamEvent`]s.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::{ChatStreamEvent, StreamEnd, ToolCall};
use crate::{Error, Result};

/// Process a stream of bytes into a stream of chat events.
///
/// Events are separated by a blank line.  Both `\n` and `\r\n` line endings
/// are accepted, comment lines are skipped, and multi-line `data:` fields are
/// joined with newlines.  A block left over when the body ends is decoded as
/// a final event.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatStreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, mut finished)| async move {
            loop {
                if let Some((block, remaining)) = split_block(&buffer) {
                    buffer = remaining;
                    match decode_block(&block) {
                        Some(event) => {
                            record(&event);
                            return Some((event, (stream, buffer, finished)));
                        }
                        None => continue,
                    }
                }

                if finished {
                    if buffer.iter().all(u8::is_ascii_whitespace) {
                        return None;
                    }
                    let block = std::mem::take(&mut buffer);
                    match decode_block(&block) {
                        Some(event) => {
                            record(&event);
                            return Some((event, (stream, buffer, finished)));
                        }
                        None => return None,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                        normalize_newlines(&mut buffer);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, finished)));
                    }
                    None => finished = true,
                }
            }
        },
    )
}

fn record(event: &Result<ChatStreamEvent>) {
    match event {
        Ok(_) => STREAM_EVENTS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
}

/// Rewrite every `\r\n` in the buffer as `\n`.
///
/// A trailing `\r` is left alone so that a pair split across two network
/// chunks is still collapsed once the `\n` arrives.
fn normalize_newlines(buffer: &mut Vec<u8>) {
    if !buffer.windows(2).any(|w| w == b"\r\n") {
        return;
    }
    let mut out = Vec::with_capacity(buffer.len());
    let mut iter = buffer.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&b'\n') {
            continue;
        }
        out.push(b);
    }
    *buffer = out;
}

/// Split the first complete event block off the front of the buffer.
fn split_block(buffer: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    Some((buffer[..end].to_vec(), buffer[end + 2..].to_vec()))
}

/// Decode one event block; comment-only and empty blocks yield `None`.
fn decode_block(block: &[u8]) -> Option<Result<ChatStreamEvent>> {
    let text = match std::str::from_utf8(block) {
        Ok(text) => text,
        Err(e) => {
            return Some(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut name: Option<&str> = None;
    let mut data: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => name = Some(value.trim()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if name.is_none() && data.is_empty() {
        return None;
    }
    Some(decode_event(name.unwrap_or("message"), &data.join("\n")))
}

/// Map an SSE event name and its data onto a typed event.
fn decode_event(name: &str, data: &str) -> Result<ChatStreamEvent> {
    match name {
        "thinking" => {
            let call: ToolCall = serde_json::from_str(data)?;
            Ok(ChatStreamEvent::Thinking(call))
        }

        "execution_tool" => {
            let value = serde_json::from_str::<Value>(data)
                .unwrap_or_else(|_| Value::String(data.to_string()));
            Ok(ChatStreamEvent::ExecutionTool(value))
        }

        // Chunks are JSON-encoded strings; anything else is taken verbatim.
        "message_chunk" => Ok(ChatStreamEvent::MessageChunk(
            serde_json::from_str::<String>(data).unwrap_or_else(|_| data.to_string()),
        )),

        "stream_end" => {
            let end = serde_json::from_str::<StreamEnd>(data).unwrap_or(StreamEnd {
                done: true,
                reason: None,
            });
            Ok(ChatStreamEvent::StreamEnd(end))
        }

        "error" => Err(Error::api(
            500,
            Some("stream_error".to_string()),
            data.to_string(),
        )),

        _ => Ok(ChatStreamEvent::Other {
            name: name.to_string(),
            data: data.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<ChatStreamEvent>> {
        let stream = stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect::<Vec<_>>(),
        );
        process_sse(stream).collect().await
    }

    #[tokio::test]
    async fn parse_chunk_event() {
        let events = collect(vec!["event: message_chunk\ndata: \"Hel\"\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatStreamEvent::MessageChunk("Hel".into())
        );
    }

    #[tokio::test]
    async fn parse_turn() {
        let data = "event: thinking\ndata: {\"function_name\":\"search_ads\",\"args\":{\"q\":\"shoes\"}}\n\n\
event: execution_tool\ndata: {\"status\":\"ok\"}\n\n\
event: message_chunk\ndata: \"Hello\"\n\n\
event: stream_end\ndata: {\"done\":true}\n\n";
        let events: Vec<ChatStreamEvent> = collect(vec![data])
            .await
            .into_iter()
            .map(|e| e.unwrap())
            .collect();
        let names: Vec<&str> = events.iter().map(ChatStreamEvent::name).collect();
        assert_eq!(
            names,
            vec!["thinking", "execution_tool", "message_chunk", "stream_end"]
        );
        match &events[0] {
            ChatStreamEvent::Thinking(call) => assert_eq!(call.function_name, "search_ads"),
            other => panic!("expected thinking, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handle_split_event() {
        let events = collect(vec!["event: message_chunk\n", "data: \"lo\"\n", "\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatStreamEvent::MessageChunk("lo".into())
        );
    }

    #[tokio::test]
    async fn crlf_line_endings() {
        let events = collect(vec![
            "event: message_chunk\r\ndata: \"a\"\r",
            "\n\r\nevent: stream_end\r\ndata: {}\r\n\r\n",
        ])
        .await;
        assert_eq!(events.len(), 2);
        assert!(events[1].as_ref().unwrap().is_end());
    }

    #[tokio::test]
    async fn comments_are_skipped() {
        let events = collect(vec![": keep-alive\n\nevent: message_chunk\ndata: \"x\"\n\n"]).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn multi_line_data_is_joined() {
        let events = collect(vec!["event: message_chunk\ndata: line one\ndata: line two\n\n"]).await;
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatStreamEvent::MessageChunk("line one\nline two".into())
        );
    }

    #[tokio::test]
    async fn chunk_that_is_not_json_is_verbatim() {
        let events = collect(vec!["event: message_chunk\ndata: plain words\n\n"]).await;
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatStreamEvent::MessageChunk("plain words".into())
        );
    }

    #[tokio::test]
    async fn unknown_event_is_passed_through() {
        let events = collect(vec!["event: heartbeat\ndata: {}\n\n"]).await;
        assert_eq!(
            events[0].as_ref().unwrap(),
            &ChatStreamEvent::Other {
                name: "heartbeat".into(),
                data: "{}".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_thinking_is_an_error() {
        let events = collect(vec!["event: thinking\ndata: not json\n\n"]).await;
        assert!(events[0].as_ref().unwrap_err().is_serialization());
    }

    #[tokio::test]
    async fn error_event() {
        let events = collect(vec!["event: error\ndata: overloaded\n\n"]).await;
        let err = events[0].as_ref().unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn trailing_block_without_blank_line() {
        let events = collect(vec!["event: stream_end\ndata: {\"done\":true}"]).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].as_ref().unwrap().is_end());
    }

    #[tokio::test]
    async fn empty_body_has_no_events() {
        assert!(collect(vec!["", "\n"]).await.is_empty());
    }
}
