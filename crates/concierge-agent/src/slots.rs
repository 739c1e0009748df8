// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progressive slot filling for domain conversations.

use std::collections::BTreeMap;

use concierge_router::REQUIRED_SLOTS;

pub type Slots = BTreeMap<String, String>;

/// Merges non-blank values from a reply's `extractedInfo` into `slots`.
///
/// Returns the number of slots that changed.
pub fn merge_extracted(slots: &mut Slots, extracted: Option<&BTreeMap<String, String>>) -> usize {
    let Some(extracted) = extracted else {
        return 0;
    };
    let mut changed = 0;
    for (key, value) in extracted {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if slots.get(key).map(String::as_str) != Some(value) {
            slots.insert(key.clone(), value.to_string());
            changed += 1;
        }
    }
    changed
}

/// Keyword guesses for the required slots, from a single message.
pub fn guess_slots(message: &str) -> Slots {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |stem: &str| words.iter().any(|w| w.starts_with(stem));

    let mut guesses = Slots::new();
    if has("berlin") {
        guesses.insert("location".into(), "Berlin".into());
    } else if has("hamburg") {
        guesses.insert("location".into(), "Hamburg".into());
    }
    if has("office") {
        guesses.insert("propertyType".into(), "commercial".into());
    } else if has("apartment") || has("flat") {
        guesses.insert("propertyType".into(), "apartment".into());
    }
    if lower.contains('€') || words.iter().any(|w| is_euro_amount(w)) {
        guesses.insert("budget".into(), "undisclosed".into());
    }
    if has("rent") {
        guesses.insert("usage".into(), "rent".into());
    } else if has("buy") || has("purchas") {
        guesses.insert("usage".into(), "buy".into());
    }
    guesses
}

/// "eur", "euro", "euros", optionally glued to a number ("1500eur").
fn is_euro_amount(word: &str) -> bool {
    let unit = word.trim_start_matches(|c: char| c.is_ascii_digit());
    matches!(unit, "eur" | "euro" | "euros")
}

/// Fills still-missing slots from [`guess_slots`]; known values are kept.
pub fn fill_missing(slots: &mut Slots, message: &str) {
    for (key, value) in guess_slots(message) {
        slots.entry(key).or_insert(value);
    }
}

/// Record-retrieval query text, once every required slot is known.
pub fn record_query(slots: &Slots) -> Option<String> {
    let parts = REQUIRED_SLOTS
        .iter()
        .map(|key| {
            slots
                .get(*key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{key}: {v}"))
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(", "))
}
