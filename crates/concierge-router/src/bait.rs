// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-filter for test and bait questions.
//!
//! Messages like "what is 2+2" or "tell me a joke" are classified as
//! off-topic without spending a model call.

use std::sync::LazyLock;

use regex::Regex;

/// Case-insensitive bait patterns.
const BAIT_PATTERNS: &[&str] = &[
    r"(?i)what('?s| is) (2\s*\+\s*2|the capital of \w+)",
    r"(?i)define [\w\s]+",
    r"(?i)who (is|was) (the president|ceo|author|founder)",
    r"(?i)translate [\w\s]+",
    r"(?i)explain [\w\s]+",
    r"(?i)tell me a (joke|fact)",
    r"(?i)\b(2\s*\+\s*2|9\s*x\s*9|capital of)\b",
];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BAIT_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Returns true if `message` matches any bait pattern.
pub fn is_bait(message: &str) -> bool {
    COMPILED.iter().any(|re| re.is_match(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(COMPILED.len(), BAIT_PATTERNS.len());
    }

    #[test]
    fn catches_bait() {
        for message in [
            "What is 2+2?",
            "whats the capital of France",
            "Tell me a joke",
            "who was the president in 1990",
            "Define entropy",
            "what's 9 x 9",
            "Translate hello to Spanish",
        ] {
            assert!(is_bait(message), "expected bait: {message}");
        }
    }

    #[test]
    fn lets_domain_questions_through() {
        for message in [
            "I want to rent an apartment in Berlin",
            "Hello!",
            "Do you have offices under 2000 euros?",
            "Thanks, that helps",
        ] {
            assert!(!is_bait(message), "unexpected bait: {message}");
        }
    }
}
