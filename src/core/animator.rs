//! The animation pipeline
//!
//! One submission: compose the chat request, make a single provider call,
//! post-process the returned text. There are no retries; failures go back
//! to the user, who can resubmit.

use crate::core::prompt::{SamplingParams, compose_request};
use crate::core::provider::{Provider, RequestError};
use crate::markup::{self, SubstitutionTable, ValidationError};
use crate::models::animation::{AnimationRequest, CleanedMarkup};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a submission produced no animation
#[derive(Debug, Error)]
pub enum AnimateError {
    #[error("Please provide {0}")]
    MissingInput(&'static str),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Could not create a valid SVG animation: {error}")]
    Validation {
        error: ValidationError,
        /// The model's unprocessed text, kept for manual inspection
        raw: String,
    },
}

/// Runs submissions against a provider
pub struct Animator {
    provider: Arc<dyn Provider>,
    substitutions: Arc<SubstitutionTable>,
    params: SamplingParams,
}

impl Animator {
    pub fn new(
        provider: Arc<dyn Provider>,
        substitutions: Arc<SubstitutionTable>,
        params: SamplingParams,
    ) -> Self {
        Self {
            provider,
            substitutions,
            params,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Animate one submission
    ///
    /// # Errors
    ///
    /// - `MissingInput` if the SVG or the instructions are blank
    /// - `Request` if the model call fails
    /// - `Validation` if the response holds no recoverable SVG
    pub async fn animate(
        &self,
        request: &AnimationRequest,
        request_id: &str,
    ) -> Result<CleanedMarkup, AnimateError> {
        if request.original_markup.trim().is_empty() {
            return Err(AnimateError::MissingInput("the SVG code"));
        }
        if request.instruction_text.trim().is_empty() {
            return Err(AnimateError::MissingInput("the animation instructions"));
        }

        info!(
            request_id,
            svg_bytes = request.original_markup.len(),
            "Requesting animation from {}",
            self.provider.provider_name()
        );
        let started = Instant::now();

        let raw = self.request_text(request).await.inspect_err(|e| {
            warn!(request_id, "Model call failed: {}", e);
        })?;
        debug!(request_id, "Raw model response: {}", raw);

        match markup::process(&raw, &self.substitutions) {
            Ok(cleaned) => {
                info!(
                    request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    animations = cleaned.animation_count,
                    "Animation created"
                );
                Ok(cleaned)
            }
            Err(error) => {
                warn!(request_id, "Model response failed validation: {}", error);
                Err(AnimateError::Validation { error, raw })
            }
        }
    }

    /// Make the single model call and return the raw response text
    async fn request_text(&self, request: &AnimationRequest) -> Result<String, RequestError> {
        let chat_request = compose_request(request, self.params);
        let response = self.provider.create_chat_completion(&chat_request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }
        if response
            .choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            == Some("length")
        {
            warn!("Model output hit the token limit and is probably truncated");
        }

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| RequestError::MalformedResponse("response contained no message content".to_string()))
    }
}
