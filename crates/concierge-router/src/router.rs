// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category routing for reply generation.
//!
//! [`ReplyRouter::route`] is a pure function of the latest classification:
//! it picks the sampling parameters, whether retrieval runs, and which
//! instruction closes the prompt.

use std::collections::BTreeMap;

use concierge_config::ConciergeConfig;
use concierge_core::types::{Category, ClassificationResult, StructuredReply};
use tracing::debug;

/// Slots a domain conversation tries to fill, in prompt order.
pub const REQUIRED_SLOTS: [&str; 4] = ["usage", "location", "budget", "propertyType"];

/// Politeness replies carry one or two suggestions.
const MAX_POLITENESS_SUGGESTIONS: usize = 2;

/// Suggestions appended to politeness replies that came back without any.
pub const POLITENESS_SUGGESTIONS: [&str; 2] = [
    "Show me apartments for rent",
    "What services does the agency offer?",
];

const REPLY_FORMAT: &str = r#"Return valid JSON of the form:
{"reply": "...", "suggestions": ["...", "..."]}"#;

const DOMAIN_REPLY_FORMAT: &str = r#"Return valid JSON of the form:
{"reply": "...", "suggestions": ["...", "..."], "extractedInfo": {"usage": "...", "location": "...", "budget": "...", "propertyType": "..."}}
Leave a field of extractedInfo empty when the user has not said it."#;

/// How a classified turn is answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPlan {
    pub category: Category,
    pub language: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Embed the message and inject grounding (and, when slots allow, a record).
    pub retrieval: bool,
    /// Fetch web snippets before answering.
    pub lookup: bool,
}

impl ReplyPlan {
    /// Final system instruction for this plan.
    ///
    /// Domain queries also list the slots already known so the model only
    /// asks for what is missing.
    pub fn instruction(&self, slots: &BTreeMap<String, String>) -> String {
        let language = &self.language;
        match self.category {
            Category::DomainQuery => {
                let known = REQUIRED_SLOTS
                    .iter()
                    .filter_map(|k| slots.get(*k).map(|v| format!("{k}: {v}")))
                    .collect::<Vec<_>>();
                let known = if known.is_empty() {
                    "nothing yet".to_string()
                } else {
                    known.join(", ")
                };
                format!(
                    "You are a professional real estate agent. Answer in the language with code \"{language}\", using the context above. \
                     Known so far: {known}. Ask for whichever of usage, location, budget and property type is still missing.\n{DOMAIN_REPLY_FORMAT}"
                )
            }
            Category::Politeness => format!(
                "The user is greeting or being polite. Respond briefly and politely in the language with code \"{language}\", \
                 then offer 1 or 2 short suggestions about real estate.\n{REPLY_FORMAT}"
            ),
            Category::GeneralAdvice => format!(
                "The user is asking for general advice. Give a short, helpful answer in the language with code \"{language}\", \
                 then guide them back to finding a property with the agency.\n{REPLY_FORMAT}"
            ),
            Category::OffTopic => format!(
                "The user's message is off-topic. Politely guide them back to real estate topics, \
                 in the language with code \"{language}\".\n{REPLY_FORMAT}"
            ),
        }
    }

    /// Applies category-specific guarantees to a normalized reply.
    pub fn finish(&self, mut reply: StructuredReply) -> StructuredReply {
        if self.category == Category::Politeness {
            if reply.suggestions.is_empty() {
                reply.suggestions = POLITENESS_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
            }
            reply.suggestions.truncate(MAX_POLITENESS_SUGGESTIONS);
        }
        if self.category != Category::DomainQuery {
            reply.extracted_info = None;
        }
        reply
    }
}

/// Maps classifications onto reply plans.
#[derive(Debug, Clone)]
pub struct ReplyRouter {
    reply_temperature: f32,
    domain_temperature: f32,
    max_tokens: u32,
}

impl ReplyRouter {
    pub fn new(reply_temperature: f32, domain_temperature: f32, max_tokens: u32) -> Self {
        Self {
            reply_temperature,
            domain_temperature,
            max_tokens,
        }
    }

    pub fn from_config(config: &ConciergeConfig) -> Self {
        Self::new(
            config.provider.reply_temperature,
            config.provider.domain_temperature,
            config.provider.reply_max_tokens,
        )
    }

    pub fn route(&self, classification: &ClassificationResult) -> ReplyPlan {
        let (temperature, retrieval, lookup) = match classification.category {
            Category::DomainQuery => (
                self.domain_temperature,
                true,
                classification.needs_external_lookup,
            ),
            Category::Politeness | Category::GeneralAdvice | Category::OffTopic => {
                (self.reply_temperature, false, false)
            }
        };

        let plan = ReplyPlan {
            category: classification.category,
            language: classification.language.clone(),
            temperature,
            max_tokens: self.max_tokens,
            retrieval,
            lookup,
        };
        debug!(category = %plan.category, retrieval, lookup, "reply routed");
        plan
    }
}

/// Instruction for the unprompted self-introduction.
pub fn introduction_instruction(language: &str) -> String {
    format!(
        "Respond in the language with code \"{language}\" with a short introduction about real estate assistance. \
         Offer 1 or 2 suggestions for what they can ask next.\n{REPLY_FORMAT}"
    )
}

/// Instruction for the rolling conversation summary.
pub fn summary_instruction(language: &str) -> String {
    format!(
        "Please provide a short summary in the language with code \"{language}\" of the conversation so far, \
         focusing on property interests, location, and budget. Reply with plain text only."
    )
}
