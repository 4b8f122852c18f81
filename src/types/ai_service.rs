//! Request and response bodies of the AI/session service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::Result;
use crate::types::ToolCall;

/// Body of `POST /session/create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionCreateRequest {
    /// Free-form session metadata; the service accepts an empty object.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Response of `POST /session/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionCreateResponse {
    /// Identifier used in `/chat/{session_id}`.
    pub session_id: String,
    /// Service-reported status, e.g. `created`.
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time as reported by the service.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /chat/{session_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequestBody {
    /// Attached files; always empty from this client.
    #[serde(default)]
    pub files: Vec<Value>,
    /// Attached images; always empty from this client.
    #[serde(default)]
    pub images: Vec<Value>,
    /// The user's message.
    pub message: String,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ChatRequestBody {
    /// A text-only chat request.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            images: Vec::new(),
            message: message.into(),
            metadata: Map::new(),
        }
    }
}

/// An agent offered by the AI service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response of `GET /agents/alls`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentsResponse {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub total_count: u64,
}

impl AgentsResponse {
    /// Finds an agent by identifier.
    pub fn find(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == agent_id)
    }
}

/// One past session of an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    #[serde(default, alias = "id")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<Value>,
}

/// Response of `GET /agents/{agent_id}/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatHistoryResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

/// A stored event of a session, newest first in `GET /sessions/{id}/events`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEvent {
    pub id: String,
    /// `user` for the person, anything else for the agent.
    pub author: String,
    /// JSON text of the form `{"parts": [...]}`.
    pub content: String,
    #[serde(with = "crate::utils::time::flexible")]
    pub timestamp: OffsetDateTime,
}

impl SessionEvent {
    /// True when the event was written by the user.
    pub fn is_user(&self) -> bool {
        self.author == "user"
    }

    /// Decodes the event's content parts.
    pub fn parts(&self) -> Result<Vec<EventPart>> {
        let content: EventContent = serde_json::from_str(&self.content)?;
        Ok(content.parts)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EventContent {
    #[serde(default)]
    parts: Vec<EventPart>,
}

/// A part of a stored event's content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<Value>,
}

/// Response of `GET /sessions/{session_id}/events`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionEventsResponse {
    #[serde(default)]
    pub events: Vec<SessionEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_shape() {
        let body = serde_json::to_string(&ChatRequestBody::new("hello")).unwrap();
        assert_eq!(body, r#"{"files":[],"images":[],"message":"hello","metadata":{}}"#);
    }

    #[test]
    fn session_event_parts() {
        let raw = r#"{
            "id": "ev1",
            "author": "facebook_marketing_agent",
            "content": "{\"parts\":[{\"function_call\":{\"name\":\"search\",\"args\":{\"q\":\"x\"}}},{\"text\":\"Done\"}]}",
            "timestamp": 1718000000.5
        }"#;
        let event: SessionEvent = serde_json::from_str(raw).unwrap();
        assert!(!event.is_user());
        let parts = event.parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].function_call.as_ref().unwrap().function_name, "search");
        assert_eq!(parts[1].text.as_deref(), Some("Done"));
    }

    #[test]
    fn bad_event_content_is_an_error() {
        let event = SessionEvent {
            id: "ev".into(),
            author: "user".into(),
            content: "not json".into(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        };
        assert!(event.parts().is_err());
    }

    #[test]
    fn agents_lookup() {
        let agents: AgentsResponse = serde_json::from_str(
            r#"{"agents":[{"id":"facebook_marketing_agent","name":"FB","description":"ads"}],"total_count":1}"#,
        )
        .unwrap();
        assert_eq!(agents.find("facebook_marketing_agent").unwrap().name, "FB");
        assert!(agents.find("other").is_none());
    }
}
