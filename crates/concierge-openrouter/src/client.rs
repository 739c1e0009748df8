// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions.
//!
//! [`OpenRouterClient`] handles authentication headers, OpenRouter's
//! attribution headers, and a single retry on transient statuses.

use std::time::Duration;

use concierge_core::ConciergeError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Referer sent to OpenRouter for app attribution.
const APP_REFERER: &str = "https://github.com/concierge/concierge";

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenRouterClient {
    /// Creates a client for `base_url` (e.g. `https://openrouter.ai/api/v1`).
    ///
    /// `app_title` is sent as `X-Title`. Without an API key no
    /// `Authorization` header is sent, which suits local servers.
    pub fn new(
        api_key: Option<&str>,
        base_url: &str,
        timeout: Duration,
        app_title: &str,
    ) -> Result<Self, ConciergeError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    ConciergeError::Config(format!("invalid API key header value: {e}"))
                })?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("HTTP-Referer", HeaderValue::from_static(APP_REFERER));
        headers.insert(
            "X-Title",
            HeaderValue::from_str(app_title).map_err(|e| {
                ConciergeError::Config(format!("invalid app title header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConciergeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the pause before a retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a non-streaming completion request.
    ///
    /// On 429/500/502/503 the request is retried once after the retry delay.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ConciergeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut attempt = 0;

        loop {
            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| ConciergeError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %request.model, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| ConciergeError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| ConciergeError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, attempt, "transient provider error, retrying");
                attempt += 1;
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("provider API error ({status}): {}", api_err.error.message),
                Err(_) => format!("provider API returned {status}: {body}"),
            };
            return Err(ConciergeError::provider(message));
        }
    }

    /// Lists available models; used as the health check.
    pub async fn ping(&self) -> Result<(), ConciergeError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .send()
            .await
            .map_err(|e| ConciergeError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ConciergeError::provider(format!("models endpoint returned {status}")))
        }
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
