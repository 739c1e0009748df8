// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and reply routing for the Concierge assistant.
//!
//! This crate provides:
//! - [`IntentClassifier`]: model-backed classification with a strict allow-list
//!   and a regex bait pre-filter
//! - [`ReplyRouter`]: maps a classification onto a [`ReplyPlan`]
//!   (sampling parameters, retrieval, closing instruction)

pub mod bait;
pub mod classifier;
pub mod router;

pub use bait::is_bait;
pub use classifier::{IntentClassifier, classification_prompt, validate_classification};
pub use router::{
    POLITENESS_SUGGESTIONS, REQUIRED_SLOTS, ReplyPlan, ReplyRouter, introduction_instruction,
    summary_instruction,
};
