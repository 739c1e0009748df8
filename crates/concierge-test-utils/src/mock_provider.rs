// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use concierge_core::ConciergeError;
use concierge_core::traits::{PluginAdapter, ProviderAdapter};
use concierge_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};

/// Text returned once the script runs out.
pub const DEFAULT_RESPONSE: &str = "mock response";

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Failure(String),
    Delayed(Duration, String),
}

/// A mock provider that answers from a FIFO script and records requests.
///
/// When the script is empty, [`DEFAULT_RESPONSE`] is returned.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Scripted::Text(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Text(text.into()));
    }

    /// Queue a provider error.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Failure(message.into()));
    }

    /// Queue a response that arrives only after `delay`.
    pub async fn push_delayed(&self, delay: Duration, text: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Delayed(delay, text.into()));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Number of scripted entries not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ConciergeError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);
        let next = self.script.lock().await.pop_front();

        let text = match next {
            None => DEFAULT_RESPONSE.to_string(),
            Some(Scripted::Text(text)) => text,
            Some(Scripted::Failure(message)) => return Err(ConciergeError::provider(message)),
            Some(Scripted::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                text
            }
        };

        Ok(ProviderResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: text,
            model,
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::types::ChatMessage;

    fn req() -> ProviderRequest {
        ProviderRequest {
            model: "mock-model".into(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn default_response_when_script_empty() {
        let provider = MockProvider::new();
        let resp = provider.complete(req()).await.unwrap();
        assert_eq!(resp.content, DEFAULT_RESPONSE);
        assert_eq!(resp.model, "mock-model");
    }

    #[tokio::test]
    async fn scripted_responses_in_order() {
        let provider = MockProvider::with_responses(["first", "second"]);
        provider.push_failure("rate limited").await;

        assert_eq!(provider.complete(req()).await.unwrap().content, "first");
        assert_eq!(provider.complete(req()).await.unwrap().content, "second");
        let err = provider.complete(req()).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert_eq!(provider.complete(req()).await.unwrap().content, DEFAULT_RESPONSE);
        assert_eq!(provider.call_count().await, 4);
    }

    #[tokio::test]
    async fn records_requests() {
        let provider = MockProvider::new();
        provider.complete(req()).await.unwrap();
        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response_waits() {
        let provider = MockProvider::new();
        provider.push_delayed(Duration::from_secs(5), "late").await;
        let started = tokio::time::Instant::now();
        let resp = provider.complete(req()).await.unwrap();
        assert_eq!(resp.content, "late");
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
