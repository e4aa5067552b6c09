//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which manages conversation
//! state and handles streaming API interactions.

use futures::StreamExt;

use crate::chat::config::ChatConfig;
use crate::chat::stream::StreamConsumer;
use crate::chat::transcript::TranscriptStore;
use crate::client::CompletionService;
use crate::error::{Error, Result};
use crate::observability::{SESSION_EXCHANGES, SESSION_FAILED_EXCHANGES, SESSION_RESETS};
use crate::render::Renderer;
use crate::types::{ChatCompletionRequest, Model, Role, Turn};

/// A chat session that manages conversation state and API interactions.
///
/// The session owns its transcript.  `send` takes `&mut self`, so at most one
/// request is in flight per session.
pub struct ChatSession<S: CompletionService> {
    service: S,
    config: ChatConfig,
    transcript: TranscriptStore,
    request_count: u64,
    failed_request_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of turns in the transcript, including the system turn.
    pub message_count: usize,
    /// The current system prompt.
    pub system_prompt: String,
    /// The maximum tokens per response, if capped.
    pub max_tokens: Option<u32>,
    /// The sampling temperature, if set.
    pub temperature: Option<f32>,
    /// Total number of API requests made.
    pub total_requests: u64,
    /// Requests that ended in an error or an interrupt.
    pub failed_requests: u64,
}

impl<S: CompletionService> ChatSession<S> {
    /// Creates a new chat session over `service`.
    pub fn new(service: S, config: ChatConfig) -> Self {
        let transcript = TranscriptStore::new(config.system_prompt.clone());
        Self {
            service,
            config,
            transcript,
            request_count: 0,
            failed_request_count: 0,
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request with the full history
    /// 3. Renders response fragments as they arrive
    /// 4. Adds the complete assistant response to history
    ///
    /// The renderer is finished whether or not the exchange succeeds.  On
    /// failure no assistant turn is recorded and the user turn stays in the
    /// history unanswered.
    ///
    /// # Errors
    ///
    /// Returns the service error that ended the stream, or an abort error if
    /// the renderer requested an interrupt.
    pub async fn send(&mut self, prompt: &str, renderer: &mut dyn Renderer) -> Result<String> {
        self.transcript.append(Role::User, prompt);

        let request = ChatCompletionRequest::new(
            self.config.model.clone(),
            self.transcript.as_context().to_vec(),
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        self.request_count = self.request_count.saturating_add(1);
        renderer.start_response();
        let outcome = Self::stream_reply(&self.service, request, renderer).await;
        renderer.finish_response();

        match outcome {
            Ok(reply) => {
                SESSION_EXCHANGES.click();
                self.transcript.append(Role::Assistant, reply.clone());
                Ok(reply)
            }
            Err(err) => {
                SESSION_FAILED_EXCHANGES.click();
                self.failed_request_count = self.failed_request_count.saturating_add(1);
                Err(err)
            }
        }
    }

    async fn stream_reply(
        service: &S,
        request: ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let fragments = StreamConsumer::new(service).consume(request);
        futures::pin_mut!(fragments);

        // Checked per arriving fragment, so a reply whose stream already ended is kept.
        let mut reply = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if renderer.should_interrupt() {
                renderer.print_interrupted();
                return Err(Error::abort("response interrupted by user"));
            }
            reply.push_str(&fragment.text);
            renderer.print_text(&fragment.text);
        }
        Ok(reply)
    }

    /// Resets the history to the current system prompt.
    pub fn clear_history(&mut self) {
        SESSION_RESETS.click();
        self.transcript.reset(self.config.system_prompt.clone());
    }

    /// Replaces the system prompt and discards the conversation.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = prompt.into();
        self.clear_history();
    }

    /// Returns the current system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.config.system_prompt
    }

    /// Text of the most recent turn, or `""` if there is no conversation yet.
    pub fn raw_last_response(&self) -> &str {
        self.transcript.last()
    }

    /// The conversation so far.
    pub fn transcript(&self) -> &[Turn] {
        self.transcript.as_context()
    }

    /// Returns the number of turns, including the system turn.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns the completion service this session talks to.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            message_count: self.message_count(),
            system_prompt: self.config.system_prompt.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            total_requests: self.request_count,
            failed_requests: self.failed_request_count,
        }
    }
}
