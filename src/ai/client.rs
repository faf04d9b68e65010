//! Model client
//!
//! Handles communication with the Anthropic Messages API:
//! - Text completions for classification over extracted text
//! - Vision completions for page-image transcription
//! - Document completions for direct-document classification
//!
//! The client is an explicit handle passed into the classifier and the text
//! acquisition chain; its lifecycle is owned by the top-level application.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model for classification and page transcription
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5";

/// The external model collaborator. Implementations take a prompt (and
/// optionally raw media) and return a free-text reply; the reply is treated
/// as untrusted, unstructured text by every caller.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Text-only completion
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String, String>;

    /// Completion over a single page image (PNG bytes)
    async fn complete_with_image(&self, prompt: &str, png: &[u8]) -> Result<String, String>;

    /// Completion over a raw PDF document
    async fn complete_with_document(
        &self,
        system_prompt: &str,
        user_message: &str,
        pdf: &[u8],
        max_tokens: u32,
    ) -> Result<String, String>;
}

/// Message content block for API requests
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: MediaSource },
    Document { source: MediaSource },
}

/// Base64 media payload for image/document blocks
#[derive(Serialize)]
struct MediaSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

impl MediaSource {
    fn base64(media_type: &str, data: &[u8]) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }
}

/// Message in conversation
#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

/// API request body
#[derive(Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

/// Content block in API response
#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

/// API response body
#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
}

/// API error response
#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Override the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send(&self, request: &ApiRequest) -> Result<String, String> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(format!("API error: {}", api_error.error.message));
            }
            return Err(format!("API error ({}): {}", status, error_text));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        let text = api_response
            .content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.clone()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String, String> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(system_prompt.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock::Text {
                    text: user_message.to_string(),
                }],
            }],
        };

        self.send(&request).await
    }

    async fn complete_with_image(&self, prompt: &str, png: &[u8]) -> Result<String, String> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            system: None,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: MediaSource::base64("image/png", png),
                    },
                    ContentBlock::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        self.send(&request).await
    }

    async fn complete_with_document(
        &self,
        system_prompt: &str,
        user_message: &str,
        pdf: &[u8],
        max_tokens: u32,
    ) -> Result<String, String> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(system_prompt.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Document {
                        source: MediaSource::base64("application/pdf", pdf),
                    },
                    ContentBlock::Text {
                        text: user_message.to_string(),
                    },
                ],
            }],
        };

        self.send(&request).await
    }
}

/// Rate limiter for model requests. Enforces a minimum interval between
/// consecutive acquisitions; the first caller passes immediately, so pacing
/// a sequential batch never leaves a trailing delay after the last item.
pub struct RateLimiter {
    semaphore: Semaphore,
    min_interval: Duration,
    // None until the first acquisition, so no Instant arithmetic can
    // underflow on a young monotonic clock.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent),
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) {
        let _permit = self.semaphore.acquire().await.expect("Semaphore closed");

        let wait_time = {
            let mut last = self.last_request.lock().await;
            let wait = match *last {
                Some(previous) => self.min_interval.saturating_sub(previous.elapsed()),
                None => Duration::ZERO,
            };
            *last = Some(Instant::now() + wait);
            wait
        };

        if !wait_time.is_zero() {
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(1, Duration::from_millis(200));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_acquire_spaces_requests() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_media_source_encodes_base64() {
        let source = MediaSource::base64("image/png", b"abc");
        assert_eq!(source.source_type, "base64");
        assert_eq!(source.media_type, "image/png");
        assert_eq!(source.data, "YWJj");
    }
}
