//! The LLM Client: the single choke-point for outbound model calls
//! (spec.md §4.6). No agent may open its own connection to the model
//! server — every call funnels through `LlmClient::generate`.

use std::time::Duration;

use qa_config::LlmConfig;
use reqwest::Client;
use tokio::sync::Semaphore;

use crate::error::LlmError;
use crate::image::ImageAttachment;
use crate::wire::{looks_like_error, CompletionRequest, CompletionResponse};

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub text: String,
}

pub struct LlmClient {
    http: Client,
    config: LlmConfig,
    /// Bounds in-flight calls to the external model (spec.md §5).
    concurrency: Semaphore,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let concurrency = Semaphore::new(config.concurrency_limit);
        Ok(Self {
            http,
            config,
            concurrency,
        })
    }

    fn completion_url(&self) -> String {
        format!("{}/completion", self.config.endpoint.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.endpoint.trim_end_matches('/'))
    }

    /// Generate a completion with retry/backoff and response validation.
    /// Optional `images` are attached as a multimodal payload after the
    /// per-image size cap is enforced.
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: usize,
        images: Vec<ImageAttachment>,
    ) -> Result<GenerateResult, LlmError> {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .map_err(|_| LlmError::Configuration("concurrency semaphore closed".to_string()))?;

        let images = crate::image::enforce_size_cap(images, self.config.max_image_bytes);
        let request = CompletionRequest {
            prompt: prompt.to_string(),
            max_tokens,
            temperature: self.config.temperature,
        };

        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let max_backoff = Duration::from_secs(self.config.max_backoff_secs);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying LLM request"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }

            match self.execute_and_validate(&request, &images).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::Network("max retries exceeded".to_string())))
    }

    async fn execute_and_validate(
        &self,
        request: &CompletionRequest,
        images: &[ImageAttachment],
    ) -> Result<GenerateResult, LlmError> {
        let mut body = serde_json::to_value(request)
            .map_err(|e| LlmError::Configuration(format!("failed to serialize request: {e}")))?;

        if !images.is_empty() {
            let encoded = crate::image::base64_encode(images)?;
            if let Some(obj) = body.as_object_mut() {
                obj.insert(
                    "images".to_string(),
                    serde_json::json!(encoded
                        .into_iter()
                        .map(|(path, data)| serde_json::json!({"path": path, "data": data}))
                        .collect::<Vec<_>>()),
                );
            }
        }

        let response = self
            .http
            .post(self.completion_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {detail}")));
            }
            return Err(LlmError::Api(format!("{status}: {detail}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed.text();
        self.validate_text(&text)?;
        Ok(GenerateResult { text })
    }

    fn validate_text(&self, text: &str) -> Result<(), LlmError> {
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty response".to_string()));
        }
        if text.chars().count() < self.config.min_response_chars {
            return Err(LlmError::InvalidResponse(format!(
                "response shorter than {} characters",
                self.config.min_response_chars
            )));
        }
        if looks_like_error(text) {
            return Err(LlmError::InvalidResponse(
                "response looks like an error marker".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn health(&self) -> bool {
        self.http
            .get(self.health_url())
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_text_rejects_short_responses() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        assert!(client.validate_text("ok").is_err());
        assert!(client
            .validate_text("This is a sufficiently long answer about gold loans.")
            .is_ok());
    }

    #[test]
    fn validate_text_rejects_error_markers() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        assert!(client
            .validate_text("Error: the model ran out of memory while generating")
            .is_err());
    }

    #[test]
    fn completion_url_strips_trailing_slash() {
        let mut config = LlmConfig::default();
        config.endpoint = "http://localhost:8000/".to_string();
        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.completion_url(), "http://localhost:8000/completion");
    }
}
