use std::env;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_DURATION, STREAM_TTFB,
};
use crate::sse::process_sse;
use crate::types::{
    Agent, AgentsResponse, ChatHistoryResponse, ChatRequestBody, ChatStreamEvent, Message,
    SessionCreateRequest, SessionCreateResponse, SessionEventsResponse,
};

/// Default base URL of the AI/session service.
pub const DEFAULT_AI_URL: &str = "https://aiapi.superbai.io/api/v1";
/// The agent whose sessions are listed when none is configured.
pub const DEFAULT_AGENT_ID: &str = "facebook_marketing_agent";
/// Environment variable consulted when no bearer token is supplied.
pub const TOKEN_ENV_VAR: &str = "FAMAREX_AI_TOKEN";
/// Environment variable consulted when no AI service URL is supplied.
pub const AI_URL_ENV_VAR: &str = "FAMAREX_AI_URL";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed stream of decoded chat events.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent>> + Send>>;

/////////////////////////////////////////// ChatBackend ////////////////////////////////////////////

/// The remote operations a chat session needs.
///
/// [`AiClient`] talks to the real service; tests drive a
/// [`ChatSession`](crate::ChatSession) with a scripted implementation.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Creates a new remote session.
    async fn create_session(&self, request: &SessionCreateRequest)
    -> Result<SessionCreateResponse>;

    /// Posts a message and returns the server-push response as typed events.
    ///
    /// The stream is lazy, finite and cannot be restarted.  Dropping it closes
    /// the connection.
    async fn open_chat_stream(
        &self,
        session_id: &str,
        request: &ChatRequestBody,
    ) -> Result<ChatEventStream>;

    /// Fetches the stored events of a session, newest first.
    async fn session_events(&self, session_id: &str) -> Result<SessionEventsResponse>;

    /// Lists the sessions of an agent.
    async fn agent_sessions(&self, agent_id: &str) -> Result<ChatHistoryResponse>;

    /// Lists every agent offered by the service.
    async fn agents(&self) -> Result<AgentsResponse>;

    /// Called with each AI message once its stream has closed.
    fn log_message(&self, _message: &Message) {}
}

///////////////////////////////////////////// AiClient /////////////////////////////////////////////

/// Client for the AI/session service.
#[derive(Clone)]
pub struct AiClient {
    token: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl AiClient {
    /// Create a new client with default settings.
    ///
    /// The bearer token can be provided directly or read from the
    /// `FAMAREX_AI_TOKEN` environment variable.  The service URL is read from
    /// `FAMAREX_AI_URL` and defaults to [`DEFAULT_AI_URL`].
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_options(token, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        token: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let token = match token {
            Some(token) => token,
            None => env::var(TOKEN_ENV_VAR).map_err(|_| {
                Error::authentication(format!(
                    "bearer token not provided and {TOKEN_ENV_VAR} environment variable not set"
                ))
            })?,
        };
        let base_url = base_url
            .or_else(|| env::var(AI_URL_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_AI_URL.to_string());
        let base_url = Url::parse(&base_url)?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            token,
            client: build_http_client(timeout)?,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Install a logger that sees every stream event and completed message.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::AUTHORIZATION, bearer(&self.token)?);
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = endpoint(&self.base_url, segments)?;
        let request = self
            .client
            .get(url)
            .headers(self.default_headers()?)
            .timeout(self.timeout);
        read_json(execute(request, self.timeout).await?).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, segments)?;
        let request = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .timeout(self.timeout)
            .json(body);
        read_json(execute(request, self.timeout).await?).await
    }

    /// Looks up a single agent by id.
    pub async fn agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        let agents = self.agents().await?;
        Ok(agents.find(agent_id).cloned())
    }
}

impl fmt::Debug for AiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ChatBackend for AiClient {
    async fn create_session(
        &self,
        request: &SessionCreateRequest,
    ) -> Result<SessionCreateResponse> {
        self.post_json(&["session", "create"], request).await
    }

    async fn open_chat_stream(
        &self,
        session_id: &str,
        request: &ChatRequestBody,
    ) -> Result<ChatEventStream> {
        let url = endpoint(&self.base_url, &["chat", session_id])?;
        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        // No total timeout here: the response body lives as long as the answer.
        let started = Instant::now();
        let response = execute(
            self.client.post(url).headers(headers).json(request),
            self.timeout,
        )
        .await?;

        let logger = self.logger.clone();
        let mut awaiting_first_chunk = true;
        let events = process_sse(response.bytes_stream()).inspect(move |item| {
            let Ok(event) = item else {
                return;
            };
            if awaiting_first_chunk && matches!(event, ChatStreamEvent::MessageChunk(_)) {
                awaiting_first_chunk = false;
                STREAM_TTFB.add(started.elapsed().as_secs_f64());
            }
            if event.is_end() {
                STREAM_DURATION.add(started.elapsed().as_secs_f64());
            }
            if let Some(logger) = &logger {
                logger.log_stream_event(event);
            }
        });
        Ok(Box::pin(events))
    }

    async fn session_events(&self, session_id: &str) -> Result<SessionEventsResponse> {
        self.get_json(&["sessions", session_id, "events"]).await
    }

    async fn agent_sessions(&self, agent_id: &str) -> Result<ChatHistoryResponse> {
        self.get_json(&["agents", agent_id, "sessions"]).await
    }

    async fn agents(&self) -> Result<AgentsResponse> {
        self.get_json(&["agents", "alls"]).await
    }

    fn log_message(&self, message: &Message) {
        if let Some(logger) = &self.logger {
            logger.log_message(message);
        }
    }
}

////////////////////////////////////////////// helpers /////////////////////////////////////////////

/// Build the HTTP client shared by all requests of one API client.
///
/// Only connecting is bounded globally; non-streaming requests set their own
/// total timeout.
pub(crate) fn build_http_client(timeout: Duration) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .connect_timeout(timeout)
        .build()
        .map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })
}

/// An `Authorization: Bearer` header value.
pub(crate) fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
        Error::validation(
            format!("bearer token is not a valid header value: {e}"),
            Some("token".to_string()),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Append percent-encoded path segments to a base URL.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::url(format!("{base} cannot be used as a base URL"), None))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a transport failure onto the crate error type.
pub(crate) fn request_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::timeout(
            format!("Request timed out: {e}"),
            Some(timeout.as_secs_f64()),
        )
    } else if e.is_connect() {
        Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
    } else {
        Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
    }
}

/// Send a request, mapping transport failures onto the crate error type.
pub(crate) async fn send_request(request: RequestBuilder, timeout: Duration) -> Result<Response> {
    CLIENT_REQUESTS.click();
    let started = Instant::now();
    let result = request.send().await;
    CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());
    result.map_err(|e| {
        CLIENT_REQUEST_ERRORS.click();
        request_error(e, timeout)
    })
}

/// Turn non-2xx responses into errors.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        CLIENT_REQUEST_ERRORS.click();
        Err(process_error_response(response).await)
    }
}

/// Send a request and turn non-2xx responses into errors.
pub(crate) async fn execute(request: RequestBuilder, timeout: Duration) -> Result<Response> {
    check_status(send_request(request, timeout).await?).await
}

/// Decode a JSON response body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {e}"),
            Some(Box::new(e)),
        )
    })
}

/// Process API response errors and convert to our Error type.
pub(crate) async fn process_error_response(response: Response) -> Error {
    let status = response.status();
    let status_code = status.as_u16();
    let status_text = status.canonical_reason().map(String::from);

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {e}"),
                Some(Box::new(e)),
            );
        }
    };
    let message = error_message(&body);

    match status_code {
        429 => Error::rate_limit(message, retry_after),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::from_status(status_code, status_text, message),
    }
}

/// Pull the human-readable message out of an error body.
///
/// Both services answer with one of `{"message": ...}`, `{"detail": ...}` or
/// `{"error": ...}`; anything else is reported verbatim.
fn error_message(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    let text = |value: &Value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => inner.get("message").and_then(Value::as_str).map(String::from),
        Value::Null => None,
        other => Some(other.to_string()),
    };
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| map.get(*key).and_then(text))
        .unwrap_or_else(|| body.to_string())
}
