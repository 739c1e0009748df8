// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end turn testing.
//!
//! `TestHarness` assembles a complete [`ChatService`] with a mock provider,
//! a mock embedder, in-memory corpora and a manual clock. It also plays the
//! persistence collaborator, storing each returned conversation by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use concierge_agent::{
    ChatService, Orchestrator, ReplySettings, SessionMemory, TurnRequest, TurnResponse,
};
use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::LookupAdapter;
use concierge_core::types::Conversation;
use concierge_memory::{
    Corpus, DomainRecord, EmbeddedRecord, EmbeddingClient, GroundingChunk, SemanticRetriever,
};
use concierge_router::{IntentClassifier, ReplyRouter};
use tokio::sync::Mutex;

use crate::clock::ManualClock;
use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::MockProvider;

/// Classifier output as the model would return it.
pub fn classification_json(category: &str, language: &str) -> String {
    serde_json::json!({
        "language": language,
        "category": category,
        "needsExternalLookup": false,
        "explanation": ""
    })
    .to_string()
}

/// Reply output as the model would return it.
pub fn reply_json(reply: &str, suggestions: &[&str]) -> String {
    serde_json::json!({"reply": reply, "suggestions": suggestions}).to_string()
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    embedder: Option<MockEmbedder>,
    records: Vec<EmbeddedRecord<DomainRecord>>,
    grounding: Vec<EmbeddedRecord<GroundingChunk>>,
    lookup: Option<Arc<dyn LookupAdapter>>,
    config: ConciergeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            embedder: None,
            records: Vec::new(),
            grounding: Vec::new(),
            lookup: None,
            config: ConciergeConfig::default(),
        }
    }

    /// Set mock provider responses, consumed in call order
    /// (classification, reply, summary, ...).
    pub fn with_mock_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the default embedder (a constant 2-d vector).
    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_record(mut self, record: DomainRecord, embedding: Vec<f32>) -> Self {
        self.records.push(EmbeddedRecord::new(record, Some(embedding)));
        self
    }

    pub fn with_grounding(mut self, section: &str, text: &str, embedding: Vec<f32>) -> Self {
        let chunk = GroundingChunk {
            section: section.to_string(),
            text: text.to_string(),
        };
        self.grounding.push(EmbeddedRecord::new(chunk, Some(embedding)));
        self
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn LookupAdapter>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Adjust the configuration before the stack is assembled.
    pub fn configure(mut self, edit: impl FnOnce(&mut ConciergeConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the test harness.
    pub fn build(self) -> TestHarness {
        let config = self.config;
        let provider = Arc::new(MockProvider::with_responses(self.responses));
        let embedder = Arc::new(
            self.embedder
                .unwrap_or_else(|| MockEmbedder::new(vec![1.0, 0.0])),
        );
        let clock = Arc::new(ManualClock::new());

        let client = EmbeddingClient::from_config(embedder.clone(), &config.embedding);
        let retriever = Arc::new(SemanticRetriever::new(
            client,
            Arc::new(Corpus::new(self.records)),
            Arc::new(Corpus::new(self.grounding)),
            config.retrieval.record_threshold,
        ));

        let classifier = IntentClassifier::from_config(provider.clone(), &config);
        let mut orchestrator = Orchestrator::new(
            classifier,
            ReplyRouter::from_config(&config),
            provider.clone(),
            retriever,
            ReplySettings::from_config(&config),
        );
        if let Some(lookup) = self.lookup {
            orchestrator = orchestrator.with_lookup(lookup);
        }

        let sessions = Arc::new(SessionMemory::with_clock(
            config.session.max_messages,
            Duration::from_secs(config.session.ttl_secs),
            clock.clone(),
        ));

        TestHarness {
            service: ChatService::new(orchestrator, sessions),
            provider,
            embedder,
            clock,
            store: Mutex::new(HashMap::new()),
        }
    }
}

/// A full chat stack over mocks, with an in-memory conversation store.
pub struct TestHarness {
    pub service: ChatService,
    pub provider: Arc<MockProvider>,
    pub embedder: Arc<MockEmbedder>,
    pub clock: Arc<ManualClock>,
    store: Mutex<HashMap<String, Conversation>>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends a message, loading and storing the conversation like a caller would.
    pub async fn send_message(
        &self,
        conversation_id: Option<&str>,
        text: &str,
    ) -> Result<TurnResponse, ConciergeError> {
        let existing = match conversation_id {
            Some(id) => self.store.lock().await.get(id).cloned(),
            None => None,
        };
        let mut request = TurnRequest::new(text);
        if let Some(id) = conversation_id {
            request = request.in_conversation(id);
        }

        let outcome = self.service.handle_turn(request, existing).await?;
        self.store
            .lock()
            .await
            .insert(outcome.conversation.id.clone(), outcome.conversation);
        Ok(outcome.response)
    }

    /// The stored conversation for `id`.
    pub async fn conversation(&self, id: &str) -> Option<Conversation> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn add_provider_response(&self, text: impl Into<String>) {
        self.provider.push_response(text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn politeness_turn_round_trip() {
        let harness = TestHarness::builder()
            .with_mock_responses([
                classification_json("politeness", "en"),
                reply_json("Hello! How can I help?", &["Show listings"]),
                "User greeted the agent.".to_string(),
            ])
            .build();

        let response = harness.send_message(None, "Hi there").await.unwrap();
        assert_eq!(response.reply.reply, "Hello! How can I help?");
        assert_eq!(response.reply.suggestions, vec!["Show listings"]);
        assert!(response.user_id.starts_with("anon-"));

        let stored = harness.conversation(&response.conversation_id).await.unwrap();
        assert_eq!(stored.summary, "User greeted the agent.");
        assert_eq!(stored.messages.len(), 3);
    }

    #[tokio::test]
    async fn blank_message_is_rejected_before_any_call() {
        let harness = TestHarness::builder().build();
        let err = harness.send_message(None, "   ").await.unwrap_err();
        assert!(err.is_caller_error());
        assert_eq!(harness.provider.call_count().await, 0);
        assert_eq!(harness.embedder.call_count(), 0);
    }
}
