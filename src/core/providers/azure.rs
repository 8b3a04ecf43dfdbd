//! Azure OpenAI provider implementation

use crate::core::config::Config;
use crate::core::provider::{Provider, RequestError};
use crate::models::openai::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Azure OpenAI provider, addressed by endpoint + deployment + API version
pub struct AzureOpenAIProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
    timeout: Duration,
}

impl AzureOpenAIProvider {
    /// Create a new Azure OpenAI provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Azure OpenAI API key
    /// * `endpoint` - Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    /// * `deployment` - Deployment name
    /// * `api_version` - REST API version
    /// * `timeout` - Request timeout
    pub fn new(
        api_key: String,
        endpoint: String,
        deployment: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment,
            api_version,
            timeout,
        })
    }

    /// Build the provider from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.deployment.clone(),
            config.api_version.clone(),
            config.request_timeout,
        )
    }

    /// Chat completions URL for the configured deployment
    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    /// Classify Azure errors and provide helpful messages
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid subscription key")
            || error_lower.contains("invalid_api_key")
            || error_lower.contains("unauthorized")
        {
            return "Invalid API key. Please check your AZURE_OPENAI_API_KEY configuration."
                .to_string();
        }

        if error_lower.contains("deploymentnotfound")
            || (error_lower.contains("deployment") && error_lower.contains("does not exist"))
        {
            return "Deployment not found. Please check your AZURE_OPENAI_DEPLOYMENT_NAME configuration."
                .to_string();
        }

        if error_lower.contains("content_filter") || error_lower.contains("content management policy") {
            return "The request was blocked by the content filter. Try rephrasing the animation description."
                .to_string();
        }

        if error_lower.contains("rate limit") || error_lower.contains("ratelimit") || error_lower.contains("quota") {
            return "Rate limit exceeded. Please wait a moment and try again.".to_string();
        }

        error_detail.to_string()
    }

    fn map_transport_error(&self, error: reqwest::Error) -> RequestError {
        if error.is_timeout() {
            RequestError::Timeout(self.timeout.as_secs())
        } else {
            RequestError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl Provider for AzureOpenAIProvider {
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, RequestError> {
        let url = self.completions_url();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Azure OpenAI returned {}: {}", status, error_text);
            let classified_error = Self::classify_error(&error_text);

            return Err(match status.as_u16() {
                401 | 403 => RequestError::Authentication(classified_error),
                429 => RequestError::RateLimit(classified_error),
                400 => RequestError::BadRequest(classified_error),
                code => RequestError::Api {
                    status: code,
                    message: classified_error,
                },
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;
        serde_json::from_str(&body)
            .map_err(|e| RequestError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }

    fn provider_name(&self) -> &str {
        "Azure OpenAI"
    }
}
