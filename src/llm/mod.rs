// ABOUTME: LLM provider abstraction for recipe generation and embeddings
// ABOUTME: Defines chat/embedding contracts implemented by OpenAI-compatible HTTP clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # LLM Providers
//!
//! Two seams sit here: [`LlmProvider`] for chat completions used by the
//! recipe generation worker, and [`EmbeddingProvider`] used by the vector
//! search server. Both have OpenAI-compatible implementations; tests plug in
//! their own.
//!
//! ```rust,no_run
//! use ashpazyar_server::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("You write recipes as JSON."),
//!         ChatMessage::user("A quick lentil soup"),
//!     ]);
//!     let response = provider.complete(&request).await;
//! }
//! ```

mod embeddings;
mod openai_compatible;
/// System prompts loaded at compile time
pub mod prompts;

pub use embeddings::OpenAiEmbeddings;
pub use openai_compatible::OpenAiCompatibleProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier; the provider default when absent
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Ask the endpoint for a JSON object response
    pub json_mode: bool,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            json_mode: false,
        }
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request a JSON object answer
    #[must_use]
    pub const fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Response from a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated message content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Chat completion provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider identifier for logs
    fn name(&self) -> &'static str;

    /// Default model used when the request names none
    fn default_model(&self) -> &str;

    /// Perform a chat completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}

/// Text embedding provider
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every text; the output has one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    /// Embed one text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.embed(&[text.to_owned()])
            .await?
            .pop()
            .ok_or_else(|| AppError::external_service("Embeddings", "No embedding returned"))
    }
}

/// Map a non-success status and body from an OpenAI-compatible endpoint to an error
pub(crate) fn parse_error_response(service: &str, status: reqwest::StatusCode, body: &str) -> AppError {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| body.chars().take(200).collect::<String>(),
        |envelope| envelope.error.message,
    );

    match status.as_u16() {
        401 | 403 => AppError::external_service(service, format!("authentication failed: {message}")),
        429 => AppError::new(
            crate::errors::ErrorCode::ExternalRateLimited,
            format!("{service} rate limit reached. Please wait a moment and try again."),
        ),
        502..=504 => AppError::new(
            crate::errors::ErrorCode::ExternalServiceUnavailable,
            format!("{service} is not responding: {message}"),
        ),
        _ => AppError::external_service(service, format!("API error ({status}): {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_error_response_parsing() {
        let err = parse_error_response(
            "LLM",
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "bad model"}}"#,
        );
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert!(err.message.contains("bad model"));

        let err = parse_error_response("LLM", reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.code, ErrorCode::ExternalRateLimited);

        let err = parse_error_response("LLM", reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.code, ErrorCode::ExternalServiceUnavailable);
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.2)
            .with_json_mode();
        assert!(request.json_mode);
        assert_eq!(request.messages[0].role.as_str(), "user");
    }
}
