use biometrics::{Collector, Counter, Moments};

use crate::types::ContentType;

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("famarex.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("famarex.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("famarex.client.request_duration_seconds");
pub(crate) static CLIENT_TOKEN_REFRESHES: Counter = Counter::new("famarex.client.token_refreshes");
pub(crate) static CLIENT_TOKEN_REFRESH_FAILURES: Counter =
    Counter::new("famarex.client.token_refresh_failures");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("famarex.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("famarex.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("famarex.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("famarex.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("famarex.stream.duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("famarex.chat.turns");
pub(crate) static CHAT_TURNS_IGNORED: Counter = Counter::new("famarex.chat.turns_ignored");
pub(crate) static CHAT_TURNS_INTERRUPTED: Counter = Counter::new("famarex.chat.turns_interrupted");
pub(crate) static CHAT_TOOL_CALLS: Counter = Counter::new("famarex.chat.tool_calls");

pub(crate) static CONTENT_TEXT: Counter = Counter::new("famarex.content.text");
pub(crate) static CONTENT_JSON: Counter = Counter::new("famarex.content.json");
pub(crate) static CONTENT_MARKDOWN: Counter = Counter::new("famarex.content.markdown");
pub(crate) static CONTENT_TABLE: Counter = Counter::new("famarex.content.table");
pub(crate) static CONTENT_CODE: Counter = Counter::new("famarex.content.code");
pub(crate) static CONTENT_CHART: Counter = Counter::new("famarex.content.chart");
pub(crate) static CONTENT_FILE: Counter = Counter::new("famarex.content.file");
pub(crate) static CONTENT_HTML: Counter = Counter::new("famarex.content.html");

/// The counter of rendered messages of `content_type`.
pub(crate) fn content_type_counter(content_type: ContentType) -> &'static Counter {
    match content_type {
        ContentType::Text => &CONTENT_TEXT,
        ContentType::Json => &CONTENT_JSON,
        ContentType::Markdown => &CONTENT_MARKDOWN,
        ContentType::Table => &CONTENT_TABLE,
        ContentType::Code => &CONTENT_CODE,
        ContentType::Chart => &CONTENT_CHART,
        ContentType::File => &CONTENT_FILE,
        ContentType::Html => &CONTENT_HTML,
    }
}

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENT_TOKEN_REFRESHES);
    collector.register_counter(&CLIENT_TOKEN_REFRESH_FAILURES);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURNS_IGNORED);
    collector.register_counter(&CHAT_TURNS_INTERRUPTED);
    collector.register_counter(&CHAT_TOOL_CALLS);

    for content_type in ContentType::ALL {
        collector.register_counter(content_type_counter(content_type));
    }
}
