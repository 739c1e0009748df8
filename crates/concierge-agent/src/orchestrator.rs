// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply orchestration for a single chat turn.
//!
//! A turn runs strictly in sequence: classify, route, retrieve (domain
//! queries only), generate, repair, summarize. Every external call is
//! guarded by a timeout and degrades to its fallback, so a turn always ends
//! with a valid [`StructuredReply`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use concierge_config::{ConciergeConfig, SummaryPolicy};
use concierge_core::guard::guarded;
use concierge_core::repair::{ParseOutcome, normalize_reply, parse_model_output};
use concierge_core::traits::{LookupAdapter, ProviderAdapter};
use concierge_core::types::{
    Category, ChatMessage, ClassificationResult, Conversation, Message, ProviderRequest, Role,
    StructuredReply,
};
use concierge_memory::SemanticRetriever;
use concierge_router::{
    IntentClassifier, ReplyPlan, ReplyRouter, introduction_instruction, summary_instruction,
};
use tracing::{debug, info};

use crate::slots;

/// Generation settings shared by every reply.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub chat_model: String,
    pub persona: String,
    pub apology: String,
    pub timeout: Duration,
    pub intro_temperature: f32,
    pub max_tokens: u32,
    pub summary_temperature: f32,
    pub summary_policy: SummaryPolicy,
    pub lookup_timeout: Duration,
}

impl ReplySettings {
    pub fn from_config(config: &ConciergeConfig) -> Self {
        Self {
            chat_model: config.provider.chat_model.clone(),
            persona: config.agent.persona.clone(),
            apology: config.agent.apology.clone(),
            timeout: Duration::from_secs(config.provider.timeout_secs),
            intro_temperature: config.provider.reply_temperature,
            max_tokens: config.provider.reply_max_tokens,
            summary_temperature: config.provider.summary_temperature,
            summary_policy: config.reply.summary_policy,
            lookup_timeout: Duration::from_secs(config.lookup.timeout_secs),
        }
    }
}

/// What a turn produced, besides the mutated conversation.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reply: StructuredReply,
    pub classification: ClassificationResult,
}

/// Drives classification, retrieval, generation and repair for one turn.
pub struct Orchestrator {
    classifier: IntentClassifier,
    router: ReplyRouter,
    provider: Arc<dyn ProviderAdapter>,
    retriever: Arc<SemanticRetriever>,
    lookup: Option<Arc<dyn LookupAdapter>>,
    settings: ReplySettings,
}

impl Orchestrator {
    pub fn new(
        classifier: IntentClassifier,
        router: ReplyRouter,
        provider: Arc<dyn ProviderAdapter>,
        retriever: Arc<SemanticRetriever>,
        settings: ReplySettings,
    ) -> Self {
        Self {
            classifier,
            router,
            provider,
            retriever,
            lookup: None,
            settings,
        }
    }

    /// Enables web lookup for domain queries that ask for it.
    pub fn with_lookup(mut self, lookup: Arc<dyn LookupAdapter>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn settings(&self) -> &ReplySettings {
        &self.settings
    }

    /// Answers `message` given the bounded `history` window.
    ///
    /// Appends the user message and the reply to `conversation`, merges
    /// extracted slots, and refreshes the summary according to the summary
    /// policy. Persisting `conversation` is the caller's job.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        history: &[Message],
        message: &str,
    ) -> TurnReport {
        let started = Instant::now();
        let classification = self.classifier.classify(history, message).await;
        let plan = self.router.route(&classification);

        if plan.retrieval {
            slots::fill_missing(&mut conversation.slots, message);
        }

        let mut prompt = self.base_prompt(history);
        prompt.push(ChatMessage::user(message));
        if plan.retrieval {
            for context in self.retrieval_context(message, &conversation.slots).await {
                prompt.push(ChatMessage::system(context));
            }
        }
        if plan.lookup {
            if let Some(results) = self.lookup_context(message).await {
                prompt.push(ChatMessage::system(results));
            }
        }
        prompt.push(ChatMessage::system(plan.instruction(&conversation.slots)));

        let reply = self.generate(&plan, prompt).await;
        let changed = slots::merge_extracted(&mut conversation.slots, reply.extracted_info.as_ref());

        conversation.push(Message::user(message));
        conversation.push(Message::assistant(reply.reply.clone()));

        if self.should_summarize(classification.category) {
            let summary = self.summarize(&conversation.messages, &classification.language).await;
            if summary.is_empty() {
                debug!(conversation_id = %conversation.id, "summary unavailable, keeping previous");
            } else {
                conversation.summary = summary;
            }
        }

        info!(
            conversation_id = %conversation.id,
            category = %classification.category,
            language = %classification.language,
            slots_changed = changed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn completed"
        );

        TurnReport {
            reply,
            classification,
        }
    }

    /// Short self-introduction with 1-2 suggestions, in `language`.
    pub async fn introduce(&self, language: &str) -> StructuredReply {
        let messages = vec![
            ChatMessage::system(self.settings.persona.clone()),
            ChatMessage::system(introduction_instruction(language)),
        ];
        let outcome = self
            .complete(
                "introduction",
                messages,
                self.settings.intro_temperature,
                self.settings.max_tokens,
            )
            .await;
        normalize_reply(&outcome, &self.settings.apology)
    }

    /// Short free-text digest of `messages` in `language`; empty on failure.
    pub async fn summarize(&self, messages: &[Message], language: &str) -> String {
        let mut prompt: Vec<ChatMessage> = messages.iter().map(ChatMessage::from).collect();
        prompt.push(ChatMessage::system(summary_instruction(language)));
        let request = self.request(
            prompt,
            self.settings.summary_temperature,
            self.settings.max_tokens,
        );

        guarded(
            "summary",
            self.settings.timeout,
            async {
                self.provider
                    .complete(request)
                    .await
                    .map(|r| r.content.trim().to_string())
            },
            String::new,
        )
        .await
    }

    fn should_summarize(&self, category: Category) -> bool {
        match self.settings.summary_policy {
            SummaryPolicy::Always => true,
            SummaryPolicy::DomainOnly => category == Category::DomainQuery,
            SummaryPolicy::Never => false,
        }
    }

    /// History as chat messages, led by the persona when it has no system message.
    fn base_prompt(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut prompt = Vec::with_capacity(history.len() + 4);
        if !history.iter().any(|m| m.role == Role::System) {
            prompt.push(ChatMessage::system(self.settings.persona.clone()));
        }
        prompt.extend(history.iter().map(ChatMessage::from));
        prompt
    }

    /// Grounding text, plus the best record once every required slot is known.
    async fn retrieval_context(&self, message: &str, known: &slots::Slots) -> Vec<String> {
        let mut context = Vec::new();

        let query = self.retriever.embed(message).await;
        if let Some(found) = self.retriever.grounding_for(query.as_deref()) {
            debug!(index = found.index, score = ?found.score, section = %found.record.section, "grounding selected");
            context.push(format!("Agency information: {}", found.record.text));
        }

        if let Some(record_query) = slots::record_query(known) {
            let vector = self.retriever.embed(&record_query).await;
            match self.retriever.record_for(vector.as_deref()) {
                Some(found) => {
                    debug!(index = found.index, score = ?found.score, "record matched");
                    context.push(format!(
                        "Based on the query, the most relevant property is: {}.",
                        found.record.headline()
                    ));
                }
                None => context.push("No matching property found.".to_string()),
            }
        }

        context
    }

    async fn lookup_context(&self, message: &str) -> Option<String> {
        let lookup = self.lookup.as_ref()?;
        let snippets = guarded(
            "lookup",
            self.settings.lookup_timeout,
            lookup.lookup(message),
            Vec::new,
        )
        .await;
        if snippets.is_empty() {
            return None;
        }
        Some(format!("Web search results:\n\n{}", snippets.join("\n\n")))
    }

    async fn generate(&self, plan: &ReplyPlan, prompt: Vec<ChatMessage>) -> StructuredReply {
        let outcome = self
            .complete("reply", prompt, plan.temperature, plan.max_tokens)
            .await;
        if outcome.as_object().is_none() {
            debug!(outcome = outcome.label(), "reply not usable, falling back to apology");
        }
        plan.finish(normalize_reply(&outcome, &self.settings.apology))
    }

    async fn complete(
        &self,
        operation: &str,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> ParseOutcome {
        let request = self.request(messages, temperature, max_tokens);
        guarded(
            operation,
            self.settings.timeout,
            async {
                self.provider
                    .complete(request)
                    .await
                    .map(|r| parse_model_output(&r.content))
            },
            || ParseOutcome::Unparseable,
        )
        .await
    }

    fn request(&self, messages: Vec<ChatMessage>, temperature: f32, max_tokens: u32) -> ProviderRequest {
        ProviderRequest {
            model: self.settings.chat_model.clone(),
            messages,
            temperature,
            max_tokens,
        }
    }
}
