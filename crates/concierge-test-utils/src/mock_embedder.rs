// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding adapter with keyword-routed vectors and a call counter.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use concierge_core::ConciergeError;
use concierge_core::traits::{EmbeddingAdapter, PluginAdapter};
use concierge_core::types::{AdapterType, HealthStatus, RawEmbedding};

/// Returns a fixed vector, or a routed one when the input contains a keyword.
pub struct MockEmbedder {
    default: Vec<f32>,
    routes: Vec<(String, Vec<f32>)>,
    failing: AtomicBool,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            default,
            routes: Vec::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// An embedder whose every call fails.
    pub fn failing() -> Self {
        let embedder = Self::new(Vec::new());
        embedder.set_failing(true);
        embedder
    }

    /// Inputs containing `keyword` (case-insensitive) embed to `vector`.
    /// Routes are checked in insertion order.
    pub fn route(mut self, keyword: &str, vector: Vec<f32>) -> Self {
        self.routes.push((keyword.to_lowercase(), vector));
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every input received, prefix included.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.routes
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, vector)| vector.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<RawEmbedding, ConciergeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(text.to_string());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConciergeError::embedding("mock embedder failure"));
        }
        Ok(RawEmbedding::Single(self.vector_for(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_by_keyword_and_counts_calls() {
        let embedder = MockEmbedder::new(vec![0.0, 1.0]).route("Berlin", vec![1.0, 0.0]);
        let routed = embedder.embed("query: flats in berlin").await.unwrap();
        assert_eq!(routed, RawEmbedding::Single(vec![1.0, 0.0]));
        let fallback = embedder.embed("query: hello").await.unwrap();
        assert_eq!(fallback, RawEmbedding::Single(vec![0.0, 1.0]));
        assert_eq!(embedder.call_count(), 2);
        assert_eq!(embedder.inputs()[1], "query: hello");
    }

    #[tokio::test]
    async fn failure_mode_toggles() {
        let embedder = MockEmbedder::failing();
        assert!(embedder.embed("x").await.is_err());
        embedder.set_failing(false);
        assert!(embedder.embed("x").await.is_ok());
        assert_eq!(embedder.call_count(), 2);
    }
}
