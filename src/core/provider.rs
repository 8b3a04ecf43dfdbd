//! Provider abstraction for the text-generation endpoint
//!
//! This module defines the trait the animator talks to and the error type
//! for a failed model call. The only production implementation is Azure
//! OpenAI; tests plug in canned providers.

use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Error types for a single model call
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl RequestError {
    /// Short machine-readable code for JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::Authentication(_) => "authentication_error",
            RequestError::RateLimit(_) => "rate_limit_error",
            RequestError::BadRequest(_) => "bad_request",
            RequestError::Api { .. } => "api_error",
            RequestError::Timeout(_) => "timeout",
            RequestError::Network(_) => "network_error",
            RequestError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Trait for LLM API providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send one non-streaming chat completion request
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, RequestError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}
