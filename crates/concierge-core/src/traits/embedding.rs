// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::RawEmbedding;

/// Turns text into one vector or a batch of sub-vectors.
///
/// A payload that is neither shape is reported as
/// [`ConciergeError::Embedding`]; pooling happens in the embedding client.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    async fn embed(&self, input: &str) -> Result<RawEmbedding, ConciergeError>;
}
