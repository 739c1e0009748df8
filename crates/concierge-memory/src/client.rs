// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query embedding with pooling, timeout, and a `None` fallback.

use std::sync::Arc;
use std::time::Duration;

use concierge_config::model::EmbeddingConfig;
use concierge_core::guard::guarded;
use concierge_core::traits::EmbeddingAdapter;
use concierge_core::types::RawEmbedding;
use tracing::warn;

use crate::vector::pool_embeddings;

/// Turns text into one document vector, or `None` when that is not possible.
///
/// A `None` means "retrieval unavailable for this turn". The client makes a
/// single attempt per call and never retries.
#[derive(Clone)]
pub struct EmbeddingClient {
    adapter: Arc<dyn EmbeddingAdapter>,
    query_prefix: String,
    timeout: Duration,
}

impl EmbeddingClient {
    pub fn new(
        adapter: Arc<dyn EmbeddingAdapter>,
        query_prefix: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            adapter,
            query_prefix: query_prefix.into(),
            timeout,
        }
    }

    pub fn from_config(adapter: Arc<dyn EmbeddingAdapter>, config: &EmbeddingConfig) -> Self {
        Self::new(
            adapter,
            config.query_prefix.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Embeds `text` with the query prefix applied.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let input = format!("{}{}", self.query_prefix, text);
        let raw = guarded(
            "embedding",
            self.timeout,
            async { self.adapter.embed(&input).await.map(Some) },
            || None,
        )
        .await?;
        collapse(raw)
    }
}

/// Reduces a raw payload to a single finite, non-empty vector.
pub fn collapse(raw: RawEmbedding) -> Option<Vec<f32>> {
    let vector = match raw {
        RawEmbedding::Single(vector) => vector,
        RawEmbedding::Batch(vectors) => match pool_embeddings(&vectors) {
            Some(pooled) => pooled,
            None => {
                warn!(
                    vectors = vectors.len(),
                    "embedding batch is empty or ragged, treating as unavailable"
                );
                return None;
            }
        },
    };

    if vector.is_empty() || vector.iter().any(|v| !v.is_finite()) {
        warn!(dim = vector.len(), "embedding vector is empty or non-finite");
        return None;
    }
    Some(vector)
}
