// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat completions provider for the Concierge assistant.
//!
//! Talks to OpenRouter by default; any server exposing `/chat/completions`
//! in the OpenAI format works when `provider.base_url` points at it.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::ProviderConfig;
use concierge_core::error::ConciergeError;
use concierge_core::traits::{PluginAdapter, ProviderAdapter};
use concierge_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{info, warn};

use crate::client::OpenRouterClient;
use crate::types::{ApiMessage, ChatCompletionRequest, ChatCompletionResponse};

/// Environment variable consulted when `provider.api_key` is not set.
const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Chat completions provider implementing [`ProviderAdapter`].
pub struct OpenRouterProvider {
    client: OpenRouterClient,
    default_model: String,
}

impl OpenRouterProvider {
    /// Creates a provider from configuration.
    ///
    /// The API key comes from `provider.api_key`, then `OPENROUTER_API_KEY`.
    /// A missing key is allowed (local servers) but logged.
    pub fn new(config: &ProviderConfig, app_title: &str) -> Result<Self, ConciergeError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());

        if api_key.is_none() {
            warn!(base_url = %config.base_url, "no provider API key configured, sending unauthenticated requests");
        }

        let client = OpenRouterClient::new(
            api_key.as_deref(),
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            app_title,
        )?;

        info!(base_url = %config.base_url, model = %config.chat_model, "chat provider initialized");

        Ok(Self::with_client(client, config.chat_model.clone()))
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: OpenRouterClient, default_model: String) -> Self {
        Self {
            client,
            default_model,
        }
    }

    fn to_api_request(&self, request: &ProviderRequest) -> ChatCompletionRequest {
        let model = if request.model.trim().is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        ChatCompletionRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }
}

fn to_provider_response(response: ChatCompletionResponse) -> Result<ProviderResponse, ConciergeError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ConciergeError::provider("response contained no choices"))?;

    Ok(ProviderResponse {
        id: response.id,
        content: choice.message.content.unwrap_or_default(),
        model: response.model,
        usage: response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

#[async_trait]
impl PluginAdapter for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ConciergeError> {
        let api_request = self.to_api_request(&request);
        let response = self.client.complete(&api_request).await?;
        to_provider_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::types::{ChatMessage, Role};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> OpenRouterProvider {
        let client = OpenRouterClient::new(None, base_url, Duration::from_secs(5), "test")
            .unwrap()
            .with_retry_delay(Duration::from_millis(5));
        OpenRouterProvider::with_client(client, "default/model".into())
    }

    fn request(model: &str) -> ProviderRequest {
        ProviderRequest {
            model: model.into(),
            messages: vec![
                ChatMessage::system("You are Sasha."),
                ChatMessage::new(Role::Assistant, "Hello!"),
                ChatMessage::user("Any flats in Hamburg?"),
            ],
            temperature: 0.0,
            max_tokens: 150,
        }
    }

    #[test]
    fn converts_roles_and_falls_back_to_default_model() {
        let api = provider("http://localhost").to_api_request(&request(""));
        assert_eq!(api.model, "default/model");
        let roles: Vec<_> = api.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "assistant", "user"]);
        assert!(!api.stream);
    }

    #[tokio::test]
    async fn complete_maps_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "openai/gpt-4o-mini", "temperature": 0.0, "max_tokens": 150})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "gen-7",
                "model": "openai/gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "{\"reply\": \"Ja\"}"}}],
                "usage": {"prompt_tokens": 30, "completion_tokens": 8}
            })))
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .complete(request("openai/gpt-4o-mini"))
            .await
            .unwrap();
        assert_eq!(response.content, "{\"reply\": \"Ja\"}");
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 30,
                output_tokens: 8
            })
        );
    }

    #[tokio::test]
    async fn empty_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "gen-0", "choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).complete(request("m")).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn health_check_reports_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let status = provider(&server.uri()).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
