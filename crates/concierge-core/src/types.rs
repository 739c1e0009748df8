// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the classifier, retrieval, and reply pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Name given to conversations created without an explicit title.
pub const DEFAULT_CONVERSATION_NAME: &str = "Default Conversation";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Embedding,
    Lookup,
}

/// Author of a message within a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single timestamped message. Order within a conversation is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the given time.
    pub fn at(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::at(Role::System, content, Utc::now())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::at(Role::User, content, Utc::now())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::at(Role::Assistant, content, Utc::now())
    }
}

/// A conversation owned by exactly one user identity.
///
/// The pipeline mutates a `Conversation` in memory (appending messages,
/// refreshing the summary and slots); durable storage is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub conversation_name: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub summary: String,
    /// Structured facts extracted so far (usage, location, budget, ...).
    #[serde(default)]
    pub slots: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation with a fresh id, seeded with the persona
    /// as its first system message.
    pub fn new(user_id: impl Into<String>, persona: &str) -> Self {
        let now = Utc::now();
        let mut messages = Vec::new();
        if !persona.trim().is_empty() {
            messages.push(Message::at(Role::System, persona, now));
        }
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            conversation_name: DEFAULT_CONVERSATION_NAME.to_string(),
            messages,
            summary: String::new(),
            slots: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and bumps `updated_at`.
    pub fn push(&mut self, message: Message) {
        self.updated_at = message.timestamp.max(self.updated_at);
        self.messages.push(message);
    }

    /// Returns the last `n` messages (or all of them if there are fewer).
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Returns the system messages, in order.
    pub fn system_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == Role::System)
    }
}

/// Closed set of intent categories.
///
/// The reply orchestrator matches exhaustively over this enum; anything the
/// classifier cannot map onto it becomes [`Category::OffTopic`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Questions about the domain itself (properties, prices, the agency).
    DomainQuery,
    /// Greetings, thanks, small talk.
    Politeness,
    /// Generic advice not tied to a listing.
    GeneralAdvice,
    #[default]
    OffTopic,
}

/// Validated output of the intent classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub language: String,
    pub category: Category,
    pub needs_external_lookup: bool,
    pub explanation: String,
}

impl ClassificationResult {
    /// The fixed value substituted whenever classification fails validation.
    pub fn safe_default() -> Self {
        Self {
            language: "en".to_string(),
            category: Category::OffTopic,
            needs_external_lookup: false,
            explanation: String::new(),
        }
    }

    /// Forces the lookup flag off and clears the explanation for every
    /// category other than [`Category::DomainQuery`].
    pub fn enforce_invariants(mut self) -> Self {
        if self.category != Category::DomainQuery {
            self.needs_external_lookup = false;
            self.explanation.clear();
        }
        self
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::safe_default()
    }
}

/// The reply shape handed back to callers.
///
/// `reply` is never empty and `suggestions` is always present; both are
/// guaranteed by [`crate::repair::normalize_reply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReply {
    pub reply: String,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<BTreeMap<String, String>>,
}

impl StructuredReply {
    /// A reply consisting of the apology text and no suggestions.
    pub fn fallback(apology: &str) -> Self {
        Self {
            reply: apology.to_string(),
            suggestions: Vec::new(),
            extracted_info: None,
        }
    }
}

// --- Language model exchange ---

/// A role/content pair sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// A completion request: ordered messages plus sampling controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw model output. `content` is arbitrary text, never assumed to be JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

// --- Embedding exchange ---

/// Vector payload returned by an embedding provider, before pooling.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEmbedding {
    /// A single document vector.
    Single(Vec<f32>),
    /// Several sub-vectors (per token or per chunk) that must be pooled.
    Batch(Vec<Vec<f32>>),
}
