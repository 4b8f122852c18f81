//! Integration tests against a live AI service.
//! These tests require a bearer token in the environment to run.

#[cfg(test)]
mod tests {
    use famarex::chat::{ChatConfig, ChatSession, TurnOutcome};
    use famarex::{AiClient, ChatBackend, PlainTextRenderer, SessionCreateRequest};

    fn live_client() -> Option<AiClient> {
        // This test requires FAMAREX_AI_TOKEN to be set
        let token = std::env::var("FAMAREX_AI_TOKEN").ok();
        if token.is_none() {
            eprintln!("Skipping test: FAMAREX_AI_TOKEN not set");
            return None;
        }
        Some(AiClient::new(token).expect("Failed to create client"))
    }

    #[tokio::test]
    async fn test_list_agents() {
        let Some(client) = live_client() else {
            return;
        };
        let agents = client.agents().await;
        assert!(agents.is_ok(), "Listing agents should succeed with a valid token");
    }

    #[tokio::test]
    async fn test_create_session() {
        let Some(client) = live_client() else {
            return;
        };
        let created = client
            .create_session(&SessionCreateRequest::default())
            .await
            .expect("session should be created");
        assert!(!created.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_streaming_response() {
        let Some(client) = live_client() else {
            return;
        };
        let mut session = ChatSession::new(client, ChatConfig::new().without_color());
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let outcome = session.send_streaming("Say hello", &mut renderer).await;
        assert!(
            matches!(outcome, Ok(TurnOutcome::Completed { .. })),
            "Streaming turn should complete: {outcome:?}"
        );
    }
}
