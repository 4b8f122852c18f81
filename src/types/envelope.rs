use serde::{Deserialize, Serialize};

/// The web service's standard response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Offset-based pagination metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl Pagination {
    /// True if another page follows this one.
    ///
    /// Falls back to comparing offsets when the server omits `has_more`.
    pub fn has_more(&self) -> bool {
        self.has_more
            .unwrap_or(self.offset.saturating_add(self.limit) < self.total)
    }
}

/// A page of results from a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// A payload the web service may or may not wrap in an [`ApiEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MaybeEnveloped<T> {
    Envelope(ApiEnvelope<T>),
    Bare(T),
}

impl<T> MaybeEnveloped<T> {
    /// The payload, wrapped or not.
    pub fn into_inner(self) -> T {
        match self {
            MaybeEnveloped::Envelope(envelope) => envelope.into_data(),
            MaybeEnveloped::Bare(data) => data,
        }
    }
}

/// The `{"message": ...}` acknowledgement of mutating endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_more_fallback() {
        let page = Pagination {
            total: 25,
            limit: 10,
            offset: 10,
            has_more: None,
        };
        assert!(page.has_more());
        let last = Pagination { offset: 20, ..page };
        assert!(!last.has_more());
        let explicit = Pagination {
            has_more: Some(false),
            ..page
        };
        assert!(!explicit.has_more());
    }

    #[test]
    fn envelope_with_null_data() {
        let env: ApiEnvelope<Option<u32>> =
            serde_json::from_str(r#"{"success":true,"data":null,"message":"deleted"}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.message.as_deref(), Some("deleted"));
        assert_eq!(env.into_data(), None);
    }

    #[test]
    fn enveloped_and_bare_payloads() {
        let wrapped: MaybeEnveloped<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);
        let bare: MaybeEnveloped<Vec<u32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_inner(), vec![3]);
    }
}
