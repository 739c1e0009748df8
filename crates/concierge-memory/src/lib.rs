// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic retrieval for the Concierge assistant.
//!
//! ## Architecture
//!
//! - **vector**: cosine similarity and element-wise pooling
//! - **HttpEmbedder**: embedding adapter over an HTTP inference endpoint
//! - **EmbeddingClient**: query prefixing, pooling, timeout, `None` fallback
//! - **Corpus**: JSON-loaded records and grounding chunks with their vectors
//! - **SemanticRetriever**: thresholded record matching and always-best grounding
//! - **GoogleSearchLookup**: web snippets for questions needing fresh facts

pub mod client;
pub mod corpus;
pub mod embedder;
pub mod lookup;
pub mod retriever;
pub mod vector;

pub use client::EmbeddingClient;
pub use corpus::{Corpus, DomainRecord, EmbeddedRecord, GroundingChunk};
pub use embedder::HttpEmbedder;
pub use lookup::GoogleSearchLookup;
pub use retriever::{RetrievalPolicy, ScoredMatch, SemanticRetriever, find_best_match};
pub use vector::{cosine_similarity, pool_embeddings};
