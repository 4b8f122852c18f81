//! Client for the web service: accounts, workspaces and content plans.
//!
//! Requests carry the stored access token.  A `401 Unauthorized` triggers one
//! token refresh followed by one retry; when the refresh is impossible or
//! fails, the token store is cleared and the caller receives an
//! authentication error so that the user signs in again.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::client::{
    DEFAULT_TIMEOUT, bearer, build_http_client, check_status, endpoint, execute, read_json,
    send_request,
};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_TOKEN_REFRESH_FAILURES, CLIENT_TOKEN_REFRESHES};
use crate::types::{AuthResponse, MaybeEnveloped, RefreshTokenRequest};

/// Default base URL of the web service.
pub const DEFAULT_API_URL: &str = "https://superbai.io/api";
/// Environment variable consulted when no web service URL is supplied.
pub const API_URL_ENV_VAR: &str = "FAMAREX_API_URL";

//////////////////////////////////////////// TokenStore ////////////////////////////////////////////

/// The tokens of a signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl Tokens {
    /// Tokens with no way to refresh them.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    /// Adds a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

impl From<&AuthResponse> for Tokens {
    fn from(auth: &AuthResponse) -> Self {
        Self {
            access_token: auth.access_token.clone(),
            refresh_token: auth.refresh_token.clone(),
        }
    }
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the web client keeps its tokens between requests.
pub trait TokenStore: Send + Sync {
    /// The current tokens, if signed in.
    fn load(&self) -> Option<Tokens>;
    /// Replaces the stored tokens.
    fn save(&self, tokens: Tokens);
    /// Forgets the stored tokens.
    fn clear(&self);
}

/// A process-local [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<Tokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: Tokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<Tokens> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, tokens: Tokens) {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
    }

    fn clear(&self) {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

//////////////////////////////////////////// RestClient ////////////////////////////////////////////

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Auth {
    /// Send the stored access token and refresh it on 401.
    Bearer,
    /// Send no credentials; used by sign-in endpoints.
    Public,
}

/// Client for the web service.
#[derive(Clone)]
pub struct RestClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    tokens: Arc<dyn TokenStore>,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl RestClient {
    /// Create a client with an empty in-memory token store.
    ///
    /// The service URL falls back to `FAMAREX_API_URL`, then [`DEFAULT_API_URL`].
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None, Arc::new(MemoryTokenStore::new()))
    }

    /// Create a client with custom settings.
    pub fn with_options(
        base_url: Option<String>,
        timeout: Option<Duration>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let base_url = base_url
            .or_else(|| std::env::var(API_URL_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: Url::parse(&base_url)?,
            timeout,
            tokens,
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The store holding this client's tokens.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// True when an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.load().is_some()
    }

    /// `GET` a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.get_with_query(segments, &[]).await
    }

    /// `GET` a JSON resource with query parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self
            .call(Method::GET, segments, query, None, Auth::Bearer)
            .await?;
        decode(body)
    }

    /// `POST` a JSON body.
    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .call(Method::POST, segments, &[], Some(body), Auth::Bearer)
            .await?;
        decode(response)
    }

    /// `POST` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self
            .call(Method::POST, segments, &[], None, Auth::Bearer)
            .await?;
        decode(response)
    }

    /// `POST` a JSON body without credentials and without refresh on 401.
    pub async fn post_public<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .call(Method::POST, segments, &[], Some(body), Auth::Public)
            .await?;
        decode(response)
    }

    /// `PUT` a JSON body.
    pub async fn put<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .call(Method::PUT, segments, &[], Some(body), Auth::Bearer)
            .await?;
        decode(response)
    }

    /// `DELETE` a resource, ignoring any response body.
    pub async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.call(Method::DELETE, segments, &[], None, Auth::Bearer)
            .await?;
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token now.
    pub async fn refresh_tokens(&self) -> Result<String> {
        let current = self.tokens.load().map(|t| t.access_token);
        self.refresh(current.as_deref()).await
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<Value>,
        auth: Auth,
    ) -> Result<Option<Bytes>> {
        let mut url = endpoint(&self.base_url, segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let token = match auth {
            Auth::Bearer => self.tokens.load().map(|t| t.access_token),
            Auth::Public => None,
        };
        let mut response = self
            .dispatch(&method, &url, body.as_ref(), token.as_deref())
            .await?;

        if auth == Auth::Bearer && response.status() == StatusCode::UNAUTHORIZED {
            let fresh = self.refresh(token.as_deref()).await?;
            response = self
                .dispatch(&method, &url, body.as_ref(), Some(&fresh))
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                self.tokens.clear();
            }
        }

        let response = check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await.map_err(|e| {
            Error::http_client(
                format!("Failed to read response body: {e}"),
                Some(Box::new(e)),
            )
        })?;
        Ok((!bytes.is_empty()).then_some(bytes))
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .timeout(self.timeout)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, bearer(token)?);
        }
        send_request(request, self.timeout).await
    }

    /// Obtain a fresh access token after `stale` was rejected.
    ///
    /// Single-flight: callers queue on the refresh lock, and a caller that
    /// finds the stored token already replaced reuses it without another
    /// round trip.
    async fn refresh(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.tokens.load();
        if let Some(tokens) = current.as_ref().filter(|t| Some(t.access_token.as_str()) != stale) {
            return Ok(tokens.access_token.clone());
        }

        let Some(refresh_token) = current.and_then(|t| t.refresh_token) else {
            CLIENT_TOKEN_REFRESH_FAILURES.click();
            self.tokens.clear();
            return Err(Error::authentication(
                "session expired and no refresh token is available",
            ));
        };

        CLIENT_TOKEN_REFRESHES.click();
        match self.request_refresh(&refresh_token).await {
            Ok(auth) => {
                let tokens = Tokens {
                    access_token: auth.access_token,
                    refresh_token: auth.refresh_token.or(Some(refresh_token)),
                };
                let access_token = tokens.access_token.clone();
                self.tokens.save(tokens);
                Ok(access_token)
            }
            Err(e) => {
                CLIENT_TOKEN_REFRESH_FAILURES.click();
                self.tokens.clear();
                Err(Error::authentication(format!(
                    "session expired and the token refresh failed: {e}"
                )))
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<AuthResponse> {
        let url = endpoint(&self.base_url, &["auth", "refresh"])?;
        let request = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&RefreshTokenRequest {
                refresh_token: refresh_token.to_string(),
            });
        let response = execute(request, self.timeout).await?;
        let auth: MaybeEnveloped<AuthResponse> = read_json(response).await?;
        Ok(auth.into_inner())
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Decode an optional response body; a missing body reads as JSON `null`.
fn decode<T: DeserializeOwned>(body: Option<Bytes>) -> Result<T> {
    let bytes = body.unwrap_or_else(|| Bytes::from_static(b"null"));
    serde_json::from_slice(&bytes).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {e}"),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load(), None);
        store.save(Tokens::new("a").with_refresh_token("r"));
        assert_eq!(store.load().unwrap().refresh_token.as_deref(), Some("r"));
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn tokens_debug_is_redacted() {
        let tokens = Tokens::new("secret-access").with_refresh_token("secret-refresh");
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn empty_body_decodes_as_null() {
        let unit: () = decode(None).unwrap();
        assert_eq!(unit, ());
        let nothing: Option<u32> = decode(None).unwrap();
        assert_eq!(nothing, None);
        assert!(decode::<Vec<u32>>(None).unwrap_err().is_serialization());
        let list: Vec<u32> = decode(Some(Bytes::from_static(b"[1,2]"))).unwrap();
        assert_eq!(list, vec![1, 2]);
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_clears_store() {
        let store = Arc::new(MemoryTokenStore::with_tokens(Tokens::new("old")));
        let client =
            RestClient::with_options(Some("http://127.0.0.1:9".into()), None, store.clone())
                .unwrap();
        let err = client.refresh(Some("old")).await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(store.load(), None);
    }

    #[tokio::test]
    async fn refresh_reuses_token_replaced_by_another_request() {
        let store = Arc::new(MemoryTokenStore::with_tokens(Tokens::new("new")));
        let client =
            RestClient::with_options(Some("http://127.0.0.1:9".into()), None, store).unwrap();
        assert_eq!(client.refresh(Some("old")).await.unwrap(), "new");
    }
}
