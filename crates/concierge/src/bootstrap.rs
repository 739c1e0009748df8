// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles the chat stack from configuration.

use std::sync::Arc;

use concierge_agent::{ChatService, Orchestrator, ReplySettings, SessionMemory};
use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::LookupAdapter;
use concierge_memory::{
    Corpus, DomainRecord, EmbeddingClient, GoogleSearchLookup, GroundingChunk, HttpEmbedder,
    SemanticRetriever,
};
use concierge_openrouter::OpenRouterProvider;
use concierge_router::{IntentClassifier, ReplyRouter};
use tracing::info;

/// Everything a command needs: the service plus the concrete adapters for
/// health checks.
pub struct Stack {
    pub service: ChatService,
    pub provider: Arc<OpenRouterProvider>,
    pub embedder: Arc<HttpEmbedder>,
    pub lookup: Option<Arc<GoogleSearchLookup>>,
    pub records: Arc<Corpus<DomainRecord>>,
    pub grounding: Arc<Corpus<GroundingChunk>>,
}

/// Builds adapters, loads both corpora and wires the service.
///
/// Missing corpus files are not an error; retrieval then degrades to no
/// context.
pub async fn build(config: &ConciergeConfig) -> Result<Stack, ConciergeError> {
    let provider = Arc::new(OpenRouterProvider::new(&config.provider, &config.agent.name)?);
    let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
    let lookup = if config.lookup.enabled {
        Some(Arc::new(GoogleSearchLookup::new(&config.lookup)?))
    } else {
        None
    };

    let records: Arc<Corpus<DomainRecord>> =
        Arc::new(Corpus::load_or_empty(&config.retrieval.records_path).await);
    let grounding: Arc<Corpus<GroundingChunk>> =
        Arc::new(Corpus::load_or_empty(&config.retrieval.grounding_path).await);
    info!(
        records = records.len(),
        grounding = grounding.len(),
        "corpora loaded"
    );

    let retriever = Arc::new(SemanticRetriever::new(
        EmbeddingClient::from_config(embedder.clone(), &config.embedding),
        records.clone(),
        grounding.clone(),
        config.retrieval.record_threshold,
    ));

    let mut orchestrator = Orchestrator::new(
        IntentClassifier::from_config(provider.clone(), config),
        ReplyRouter::from_config(config),
        provider.clone(),
        retriever,
        ReplySettings::from_config(config),
    );
    if let Some(lookup) = &lookup {
        let adapter: Arc<dyn LookupAdapter> = lookup.clone();
        orchestrator = orchestrator.with_lookup(adapter);
    }

    let sessions = Arc::new(SessionMemory::from_config(&config.session));

    Ok(Stack {
        service: ChatService::new(orchestrator, sessions),
        provider,
        embedder,
        lookup,
        records,
        grounding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_with_missing_corpora() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConciergeConfig::default();
        config.provider.api_key = Some("test-key".into());
        config.retrieval.records_path = dir.path().join("records.json");
        config.retrieval.grounding_path = dir.path().join("grounding.json");

        let stack = build(&config).await.unwrap();
        assert!(stack.records.is_empty());
        assert!(stack.grounding.is_empty());
        assert!(stack.lookup.is_none());
        assert!(stack.service.sessions().is_empty());
    }

    #[tokio::test]
    async fn loads_corpus_files() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("records.json");
        std::fs::write(
            &records,
            r#"[{"title": "Loft", "price": 1500, "embedding": [1.0, 0.0]}]"#,
        )
        .unwrap();
        let mut config = ConciergeConfig::default();
        config.retrieval.records_path = records;
        config.retrieval.grounding_path = dir.path().join("missing.json");

        let stack = build(&config).await.unwrap();
        assert_eq!(stack.records.len(), 1);
        assert_eq!(stack.records.first().unwrap().record.title, "Loft");
    }
}
