// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Concierge assistant.
//!
//! This crate provides the adapter traits for the external collaborators
//! (language model, embedding provider, web lookup), the domain types that
//! flow through a chat turn, the shared error type, the JSON repair parser
//! for model output, and the timeout guard used around every external call.

pub mod error;
pub mod guard;
pub mod repair;
pub mod traits;
pub mod types;

pub use error::ConciergeError;
pub use repair::{DEFAULT_APOLOGY, ParseOutcome};
pub use types::{
    AdapterType, Category, ChatMessage, ClassificationResult, Conversation, HealthStatus, Message,
    ProviderRequest, ProviderResponse, RawEmbedding, Role, StructuredReply, TokenUsage,
};

pub use traits::{EmbeddingAdapter, LookupAdapter, PluginAdapter, ProviderAdapter};
