// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Concierge assistant.

use std::time::Duration;

use thiserror::Error;

/// Boxed source error carried by the adapter-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type shared by adapters and the turn pipeline.
///
/// Only [`ConciergeError::InvalidInput`] is ever returned from a chat turn.
/// Every other variant is absorbed by the component that detects it and
/// turned into that component's fallback value.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller supplied a request the pipeline refuses to process.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Language model errors (HTTP failure, non-success status, empty choices).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<BoxError>,
    },

    /// Embedding provider errors (HTTP failure, malformed vector payload).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<BoxError>,
    },

    /// External web lookup errors.
    #[error("lookup error: {message}")]
    Lookup {
        message: String,
        source: Option<BoxError>,
    },

    /// Corpus loading errors (unreadable file, invalid JSON).
    #[error("corpus error: {message}")]
    Corpus {
        message: String,
        source: Option<BoxError>,
    },

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Shorthand for an [`ConciergeError::InvalidInput`] error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an embedding error without an underlying source.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for errors the turn service surfaces to its caller.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
