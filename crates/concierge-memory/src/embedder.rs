// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding adapter.
//!
//! Speaks either the Hugging Face `feature-extraction` pipeline or an
//! OpenAI-compatible `/embeddings` endpoint. The response may be a flat
//! vector, a batch of per-token vectors, a nested batch, or an OpenAI
//! `data` envelope; all of them are reported as a [`RawEmbedding`] and
//! pooled later by the [`EmbeddingClient`](crate::client::EmbeddingClient).

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::{EmbeddingApi, EmbeddingConfig};
use concierge_core::error::ConciergeError;
use concierge_core::traits::{EmbeddingAdapter, PluginAdapter};
use concierge_core::types::{AdapterType, HealthStatus, RawEmbedding};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Environment variable consulted when no key is configured.
const API_KEY_ENV: &str = "HF_API_KEY";

/// Response shapes accepted from embedding endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Flat(Vec<f32>),
    Batch(Vec<Vec<f32>>),
    /// `[[[...], [...]]]`: one input, per-token vectors.
    NestedBatch(Vec<Vec<Vec<f32>>>),
    OpenAi { data: Vec<EmbeddingDatum> },
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl EmbeddingPayload {
    fn into_raw(self) -> Result<RawEmbedding, ConciergeError> {
        let raw = match self {
            Self::Flat(vector) => RawEmbedding::Single(vector),
            Self::Batch(vectors) => RawEmbedding::Batch(vectors),
            Self::NestedBatch(mut inputs) => match inputs.len() {
                1 => RawEmbedding::Batch(inputs.remove(0)),
                n => {
                    return Err(ConciergeError::embedding(format!(
                        "expected one input in nested batch, got {n}"
                    )));
                }
            },
            Self::OpenAi { mut data } => match data.len() {
                1 => RawEmbedding::Single(data.remove(0).embedding),
                _ => RawEmbedding::Batch(data.into_iter().map(|d| d.embedding).collect()),
            },
        };
        Ok(raw)
    }
}

/// Embedding adapter backed by an HTTP inference endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    api: EmbeddingApi,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ConciergeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConciergeError::Embedding {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            client,
            api: config.api,
            endpoint: endpoint_for(config),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, input: &str) -> serde_json::Value {
        match self.api {
            EmbeddingApi::FeatureExtraction => json!({ "inputs": input }),
            EmbeddingApi::OpenAi => json!({ "model": self.model, "input": input }),
        }
    }
}

fn endpoint_for(config: &EmbeddingConfig) -> String {
    let base = config.base_url.trim_end_matches('/');
    match config.api {
        EmbeddingApi::FeatureExtraction => {
            format!("{base}/pipeline/feature-extraction/{}", config.model)
        }
        EmbeddingApi::OpenAi => format!("{base}/embeddings"),
    }
}

#[async_trait]
impl PluginAdapter for HttpEmbedder {
    fn name(&self) -> &str {
        "http-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        match self.embed("health check").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbedder {
    async fn embed(&self, input: &str) -> Result<RawEmbedding, ConciergeError> {
        let mut request = self.client.post(&self.endpoint).json(&self.request_body(input));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| ConciergeError::Embedding {
            message: format!("embedding request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ConciergeError::Embedding {
            message: format!("failed to read embedding response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(ConciergeError::embedding(format!(
                "embedding endpoint returned {status}: {}",
                truncate(&body, 200)
            )));
        }

        let payload: EmbeddingPayload =
            serde_json::from_str(&body).map_err(|e| ConciergeError::Embedding {
                message: "malformed embedding payload".to_string(),
                source: Some(Box::new(e)),
            })?;

        let raw = payload.into_raw()?;
        debug!(
            shape = match &raw {
                RawEmbedding::Single(_) => "single",
                RawEmbedding::Batch(_) => "batch",
            },
            "embedding received"
        );
        Ok(raw)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, api: EmbeddingApi) -> EmbeddingConfig {
        EmbeddingConfig {
            api,
            base_url: server.uri(),
            api_key: Some("hf-test".into()),
            model: "intfloat/multilingual-e5-base".into(),
            query_prefix: "query: ".into(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn flat_vector_is_single() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pipeline/feature-extraction/intfloat/multilingual-e5-base"))
            .and(header("authorization", "Bearer hf-test"))
            .and(body_json(json!({"inputs": "query: flat"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([0.1, 0.2, 0.3])))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::FeatureExtraction)).unwrap();
        let raw = embedder.embed("query: flat").await.unwrap();
        assert_eq!(raw, RawEmbedding::Single(vec![0.1, 0.2, 0.3]));
    }

    #[tokio::test]
    async fn per_token_vectors_are_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([[1.0, 2.0], [3.0, 4.0]])),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::FeatureExtraction)).unwrap();
        let raw = embedder.embed("tokens").await.unwrap();
        assert_eq!(raw, RawEmbedding::Batch(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
    }

    #[tokio::test]
    async fn nested_batch_unwraps_single_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[[1.0], [3.0]]])))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::FeatureExtraction)).unwrap();
        let raw = embedder.embed("nested").await.unwrap();
        assert_eq!(raw, RawEmbedding::Batch(vec![vec![1.0], vec![3.0]]));
    }

    #[tokio::test]
    async fn openai_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_json(json!({"model": "intfloat/multilingual-e5-base", "input": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::OpenAi)).unwrap();
        assert_eq!(
            embedder.embed("hi").await.unwrap(),
            RawEmbedding::Single(vec![0.5, 0.5])
        );
    }

    #[tokio::test]
    async fn malformed_payload_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "loading"})))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::FeatureExtraction)).unwrap();
        let err = embedder.embed("x").await.unwrap_err();
        assert!(matches!(err, ConciergeError::Embedding { .. }));
    }

    #[tokio::test]
    async fn server_error_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config(&server, EmbeddingApi::FeatureExtraction)).unwrap();
        let err = embedder.embed("x").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("äöü", 2), "äö");
        assert_eq!(truncate("ab", 10), "ab");
    }
}
