// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Concierge assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup with a suggestion instead of being silently ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration. Every section is optional and defaults sensibly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConciergeConfig {
    /// Assistant name, persona and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat-completions endpoint used for classification, replies, and summaries.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Intent classification call.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Embedding endpoint used for retrieval.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Corpus files and similarity thresholds.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Short-term memory bounds.
    #[serde(default)]
    pub session: SessionConfig,

    /// Reply and summary generation.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Optional web search used for domain questions that need fresh facts.
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Assistant identity and behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name the assistant introduces itself with.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System prompt seeded as the first message of every new conversation.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Reply text used whenever the model produced nothing usable.
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            persona: default_persona(),
            apology: default_apology(),
        }
    }
}

fn default_agent_name() -> String {
    "concierge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_persona() -> String {
    "You are Sasha, a friendly agent at a real estate agency. Always return valid JSON."
        .to_string()
}

fn default_apology() -> String {
    "Sorry, I don't have an answer right now.".to_string()
}

/// OpenAI-compatible chat-completions provider (OpenRouter by default).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the chat-completions API.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// API key. `None` falls back to the `OPENROUTER_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for replies, introductions, and summaries.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for intent classification.
    #[serde(default = "default_chat_model")]
    pub classifier_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature for non-domain replies.
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    /// Sampling temperature for domain-query replies.
    #[serde(default = "default_domain_temperature")]
    pub domain_temperature: f32,

    /// Output-token budget for replies.
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,

    /// Sampling temperature for summaries.
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: None,
            chat_model: default_chat_model(),
            classifier_model: default_chat_model(),
            timeout_secs: default_provider_timeout_secs(),
            reply_temperature: default_reply_temperature(),
            domain_temperature: default_domain_temperature(),
            reply_max_tokens: default_reply_max_tokens(),
            summary_temperature: default_summary_temperature(),
        }
    }
}

fn default_provider_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_reply_temperature() -> f32 {
    0.7
}

fn default_domain_temperature() -> f32 {
    0.8
}

fn default_reply_max_tokens() -> u32 {
    500
}

fn default_summary_temperature() -> f32 {
    0.5
}

/// Intent classifier settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Output-token budget for the classification call.
    #[serde(default = "default_classifier_max_tokens")]
    pub max_tokens: u32,

    /// Short-circuit obvious test questions ("what is 2+2") without a model call.
    #[serde(default = "default_true")]
    pub bait_filter: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_classifier_max_tokens(),
            bait_filter: true,
        }
    }
}

fn default_classifier_max_tokens() -> u32 {
    150
}

fn default_true() -> bool {
    true
}

/// Wire format spoken by the embedding endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingApi {
    /// Hugging Face inference `feature-extraction` pipeline (`{"inputs": ...}`).
    #[default]
    FeatureExtraction,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Request and response shape of the endpoint.
    #[serde(default)]
    pub api: EmbeddingApi,

    /// Base URL of the embedding API.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// API key. `None` falls back to the `HF_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model id.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Prepended to every query before embedding (e5-style models expect it).
    #[serde(default = "default_query_prefix")]
    pub query_prefix: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api: EmbeddingApi::default(),
            base_url: default_embedding_base_url(),
            api_key: None,
            model: default_embedding_model(),
            query_prefix: default_query_prefix(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_embedding_model() -> String {
    "intfloat/multilingual-e5-base".to_string()
}

fn default_query_prefix() -> String {
    "query: ".to_string()
}

fn default_embedding_timeout_secs() -> u64 {
    10
}

/// Corpus locations and match thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a record match to be shown.
    #[serde(default = "default_record_threshold")]
    pub record_threshold: f32,

    /// JSON array of records, each with an `embedding` field.
    #[serde(default = "default_records_path")]
    pub records_path: PathBuf,

    /// JSON array of `{section, text, embedding}` grounding chunks.
    #[serde(default = "default_grounding_path")]
    pub grounding_path: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            record_threshold: default_record_threshold(),
            records_path: default_records_path(),
            grounding_path: default_grounding_path(),
        }
    }
}

fn default_record_threshold() -> f32 {
    0.5
}

fn default_records_path() -> PathBuf {
    PathBuf::from("data/records.json")
}

fn default_grounding_path() -> PathBuf {
    PathBuf::from("data/grounding.json")
}

/// Short-term session memory bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Messages kept per session; the oldest are dropped first.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Idle time after which a session buffer is swept.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// How often expired sessions are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_messages() -> usize {
    20
}

fn default_ttl_secs() -> u64 {
    15 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// When the rolling conversation summary is regenerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPolicy {
    /// After every turn, whatever the category.
    #[default]
    Always,
    /// Only after domain-query turns.
    DomainOnly,
    /// Never; the summary keeps whatever it last held.
    Never,
}

/// Reply generation settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyConfig {
    /// Which turns refresh the rolling summary.
    #[serde(default)]
    pub summary_policy: SummaryPolicy,
}

/// External web lookup (Google Custom Search JSON API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    /// Off unless set; needs `api_key` and `engine_id`.
    #[serde(default)]
    pub enabled: bool,

    /// Custom Search endpoint.
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,

    /// Custom Search API key. Required when `enabled` is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Programmable search engine id (`cx`).
    #[serde(default)]
    pub engine_id: Option<String>,

    /// Snippets injected per lookup.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_lookup_base_url(),
            api_key: None,
            engine_id: None,
            max_results: default_max_results(),
            timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

fn default_lookup_base_url() -> String {
    "https://customsearch.googleapis.com/customsearch/v1".to_string()
}

fn default_max_results() -> usize {
    3
}

fn default_lookup_timeout_secs() -> u64 {
    10
}
