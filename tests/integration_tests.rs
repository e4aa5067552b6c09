//! Integration tests against a live chat-completions API.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use streamchat::chat::{ChatConfig, ChatSession, PlainTextRenderer};
    use streamchat::{ChatCompletionRequest, CompletionService, Completions, Model, Turn};

    #[tokio::test]
    async fn test_streaming_response() {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: OPENAI_API_KEY not set");
            return;
        }

        let client = Completions::new(api_key).expect("Failed to create client");
        let request = ChatCompletionRequest::new(
            Model::default(),
            vec![Turn::user("Count to 3")],
        )
        .with_max_tokens(Some(10));

        let stream = client.stream(request).await;
        assert!(stream.is_ok(), "Stream request should succeed");
        let chunks: Vec<_> = stream.unwrap().collect().await;
        assert!(chunks.iter().all(|chunk| chunk.is_ok()));
    }

    #[tokio::test]
    async fn test_session_exchange() {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: OPENAI_API_KEY not set");
            return;
        }

        let client = Completions::new(api_key).expect("Failed to create client");
        let mut session = ChatSession::new(client, ChatConfig::new().with_max_tokens(Some(10)));
        let mut renderer = PlainTextRenderer::with_color(false);

        let reply = session
            .send("Say 'test passed'", &mut renderer)
            .await
            .expect("Exchange should succeed with valid API key");
        assert_eq!(session.message_count(), 3);
        assert_eq!(session.raw_last_response(), reply);
    }

    #[tokio::test]
    async fn test_bad_key_is_service_error() {
        if std::env::var("OPENAI_API_KEY").is_err() {
            eprintln!("Skipping test: OPENAI_API_KEY not set");
            return;
        }

        let client = Completions::new(Some("sk-invalid".to_string())).unwrap();
        let mut session = ChatSession::new(client, ChatConfig::new());
        let mut renderer = PlainTextRenderer::with_color(false);

        let err = session.send("hello", &mut renderer).await.unwrap_err();
        assert!(err.is_service_error());
        assert_eq!(session.message_count(), 2);
    }
}
