// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model intent classification.
//!
//! The model is asked for `{language, category, needsExternalLookup,
//! explanation}` as raw JSON. Its answer is validated against a strict
//! allow-list: anything outside it, and any call or parse failure, becomes
//! [`ClassificationResult::safe_default`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use concierge_config::ConciergeConfig;
use concierge_core::guard::guarded;
use concierge_core::repair::{ParseOutcome, parse_model_output};
use concierge_core::traits::ProviderAdapter;
use concierge_core::types::{
    Category, ChatMessage, ClassificationResult, Message, ProviderRequest, Role,
};
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::bait::is_bait;

/// Classifies the newest user message of a conversation.
pub struct IntentClassifier {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    bait_filter: bool,
}

impl IntentClassifier {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            timeout,
            bait_filter: true,
        }
    }

    pub fn from_config(provider: Arc<dyn ProviderAdapter>, config: &ConciergeConfig) -> Self {
        Self::new(
            provider,
            config.provider.classifier_model.clone(),
            config.classifier.max_tokens,
            Duration::from_secs(config.provider.timeout_secs),
        )
        .with_bait_filter(config.classifier.bait_filter)
    }

    /// Enables or disables the regex pre-filter.
    pub fn with_bait_filter(mut self, enabled: bool) -> Self {
        self.bait_filter = enabled;
        self
    }

    /// Classifies `message` given the prior `history`.
    ///
    /// Never fails: bait, provider errors, timeouts, unparseable output and
    /// values outside the allow-list all yield the safe default.
    pub async fn classify(&self, history: &[Message], message: &str) -> ClassificationResult {
        if self.bait_filter && is_bait(message) {
            info!("bait question detected, classifying as off-topic");
            return ClassificationResult::safe_default();
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(classification_prompt(history, message))],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let outcome = guarded(
            "classification",
            self.timeout,
            async {
                self.provider
                    .complete(request)
                    .await
                    .map(|response| parse_model_output(&response.content))
            },
            || ParseOutcome::Unparseable,
        )
        .await;

        let result = validate_classification(&outcome);
        debug!(
            outcome = outcome.label(),
            language = %result.language,
            category = %result.category,
            needs_external_lookup = result.needs_external_lookup,
            "message classified"
        );
        result
    }
}

/// Builds the single system instruction sent to the classifier model.
///
/// System messages in `history` (persona, injected context) are left out.
pub fn classification_prompt(history: &[Message], message: &str) -> String {
    let conversation = history
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    let categories = Category::iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a strict classifier for a real estate agency assistant. Identify three things about the user's newest message:

1) "language": the language of the newest message as a short code ("en", "de", "tr", ...).
2) "category": one of {categories}.
   - "domain-query": anything that moves the property consultation forward (renting, buying, listings, prices, locations, the agency and its services), even if part of the message is off-topic.
   - "politeness": greetings, introductions, thanks, goodbyes, or uncertain statements like "I don't know".
   - "general-advice": general questions about moving, neighbourhoods, financing or paperwork that do not need a specific listing.
   - "off-topic": anything else.
3) "needsExternalLookup": true only for "domain-query" messages that need current facts from the web (market rates, new regulations); otherwise false.
Add "explanation" with a few words on why a lookup is needed, or "".

Conversation so far:
{conversation}

User's new message:
"{message}"

Return ONLY valid JSON of the form:
{{"language": "...", "category": "...", "needsExternalLookup": false, "explanation": ""}}"#
    )
}

/// Validates parsed classifier output against the allow-list.
///
/// `language` must look like a language code and `category` must name a
/// [`Category`] exactly; otherwise the whole result is the safe default.
/// A non-boolean lookup flag counts as `false` and a non-string explanation
/// as empty. Invariants are enforced last.
pub fn validate_classification(outcome: &ParseOutcome) -> ClassificationResult {
    let Some(object) = outcome.as_object() else {
        return ClassificationResult::safe_default();
    };

    let language = object
        .get("language")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|l| is_language_code(l));
    let category = object
        .get("category")
        .and_then(Value::as_str)
        .and_then(|c| Category::from_str(c.trim()).ok());

    let (Some(language), Some(category)) = (language, category) else {
        debug!(?object, "classification rejected by allow-list");
        return ClassificationResult::safe_default();
    };

    ClassificationResult {
        language: language.to_ascii_lowercase(),
        category,
        needs_external_lookup: object
            .get("needsExternalLookup")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        explanation: object
            .get("explanation")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
    .enforce_invariants()
}

/// Two or three ASCII letters with an optional region tag, e.g. `de` or `pt-BR`.
fn is_language_code(code: &str) -> bool {
    let mut parts = code.split(['-', '_']);
    let primary = parts.next().unwrap_or_default();
    let region = parts.next();
    if parts.next().is_some() {
        return false;
    }
    (2..=3).contains(&primary.len())
        && primary.chars().all(|c| c.is_ascii_alphabetic())
        && region.is_none_or(|r| (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric()))
}
