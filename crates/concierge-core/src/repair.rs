// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recovery of a single JSON object from free-form model output.
//!
//! Language models wrap JSON in prose and code fences, leave trailing
//! commas, forget to quote keys, or stop mid-object. Parsing happens in
//! three steps:
//!
//! 1. [`extract_json_object`] cuts the first brace-balanced object out of
//!    the text (or everything after the first `{` if it never balances).
//! 2. [`repair_json`] rewrites common malformations into strict JSON.
//! 3. [`parse_model_output`] parses the result into a [`ParseOutcome`].
//!
//! [`normalize_reply`] then turns any outcome into a valid
//! [`StructuredReply`], so callers never branch on parser internals.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::types::StructuredReply;

/// Reply text used whenever the model produced nothing usable.
pub const DEFAULT_APOLOGY: &str = "Sorry, I don't have an answer right now.";

/// Result of trying to read a JSON object out of model output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A JSON value was recovered (always an object in practice).
    Parsed(Value),
    /// Text contained a `{` but neither the repaired nor the raw candidate parsed.
    Unparseable,
    /// Text contained no `{` at all.
    NoJsonFound,
}

impl ParseOutcome {
    /// Short label for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parsed(_) => "parsed",
            Self::Unparseable => "unparseable",
            Self::NoJsonFound => "no_json_found",
        }
    }

    /// Returns the top-level object, if one was parsed.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Parsed(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// The repair pass gave up on the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    #[error("unexpected `{found}` at byte {position}")]
    MismatchedCloser { found: char, position: usize },
}

/// Returns the first brace-balanced `{...}` substring of `text`.
///
/// Braces inside double-quoted strings do not count towards the depth. If the
/// object never closes, everything from the first `{` to the end is returned.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Some(&text[start..])
}

/// Rewrites near-JSON into strict JSON.
///
/// Handles trailing commas, unquoted and single-quoted keys or strings,
/// raw control characters inside strings, `//` and `/* */` comments,
/// Python/JS literals (`True`, `None`, `undefined`), and unclosed
/// strings, arrays, or objects at the end of input. A closer that does not
/// match the innermost open bracket is an error.
pub fn repair_json(candidate: &str) -> Result<String, RepairError> {
    let chars: Vec<(usize, char)> = candidate.char_indices().collect();
    let mut out = String::with_capacity(candidate.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            '{' | '[' => {
                stack.push(c);
                out.push(c);
            }
            '}' | ']' => {
                let opener = if c == '}' { '{' } else { '[' };
                if stack.pop() != Some(opener) {
                    return Err(RepairError::MismatchedCloser { found: c, position });
                }
                drop_trailing_comma(&mut out);
                out.push(c);
            }
            '/' if matches!(chars.get(i + 1), Some((_, '/'))) => {
                while i < chars.len() && chars[i].1 != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if matches!(chars.get(i + 1), Some((_, '*'))) => {
                i += 2;
                while i < chars.len() && !(chars[i].1 == '*' && matches!(chars.get(i + 1), Some((_, '/')))) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            c if c.is_ascii_digit() || c == '-' => {
                while i < chars.len() && is_number_char(chars[i].1) {
                    out.push(chars[i].1);
                    i += 1;
                }
                continue;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let begin = i;
                while i < chars.len() && is_word_char(chars[i].1) {
                    i += 1;
                }
                let word: String = chars[begin..i].iter().map(|(_, ch)| *ch).collect();
                let is_key = stack.last() == Some(&'{') && next_significant(&chars, i) == Some(':');
                if is_key {
                    push_quoted(&mut out, &word);
                } else {
                    match word.as_str() {
                        "true" | "True" => out.push_str("true"),
                        "false" | "False" => out.push_str("false"),
                        "null" | "None" | "undefined" | "NaN" => out.push_str("null"),
                        _ => push_quoted(&mut out, &word),
                    }
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    while let Some(open) = stack.pop() {
        drop_trailing_comma(&mut out);
        out.push(if open == '{' { '}' } else { ']' });
    }

    Ok(out)
}

/// Extracts, repairs, and parses the JSON object embedded in `text`.
pub fn parse_model_output(text: &str) -> ParseOutcome {
    let Some(candidate) = extract_json_object(text) else {
        return ParseOutcome::NoJsonFound;
    };

    let repaired = match repair_json(candidate) {
        Ok(fixed) => Cow::Owned(fixed),
        Err(e) => {
            debug!(error = %e, "json repair failed, using raw candidate");
            Cow::Borrowed(candidate)
        }
    };

    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => ParseOutcome::Parsed(value),
        Err(repaired_err) => {
            if repaired.as_ref() != candidate {
                if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                    return ParseOutcome::Parsed(value);
                }
            }
            debug!(error = %repaired_err, "model output is not parseable json");
            ParseOutcome::Unparseable
        }
    }
}

/// Turns any parse outcome into a valid [`StructuredReply`].
///
/// A missing, blank, or non-string `reply` becomes `apology`. A non-array
/// `suggestions` becomes empty; scalar suggestion items are stringified and
/// anything else is dropped. `extractedInfo` keeps scalar values, flattening
/// one level of nested objects into dotted keys (`contact.email`).
pub fn normalize_reply(outcome: &ParseOutcome, apology: &str) -> StructuredReply {
    let Some(object) = outcome.as_object() else {
        return StructuredReply::fallback(apology);
    };

    let reply = object
        .get("reply")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(apology)
        .to_string();

    let suggestions = match object.get("suggestions") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    };

    let extracted_info = object.get("extractedInfo").and_then(flatten_slots);

    StructuredReply {
        reply,
        suggestions,
        extracted_info,
    }
}

/// Parses and normalizes in one step.
pub fn parse_structured_reply(text: &str, apology: &str) -> StructuredReply {
    normalize_reply(&parse_model_output(text), apology)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flatten_slots(value: &Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(fields) = value else {
        return None;
    };
    let mut slots = BTreeMap::new();
    for (key, field) in fields {
        match field {
            Value::Object(nested) => {
                for (inner_key, inner) in nested {
                    if let Some(text) = scalar_text(inner) {
                        slots.insert(format!("{key}.{inner_key}"), text);
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    slots.insert(key.clone(), text);
                }
            }
        }
    }
    (!slots.is_empty()).then_some(slots)
}

/// Copies a quoted string starting at `chars[start]` as a double-quoted JSON
/// string. Returns the index just past the closing quote.
fn copy_string(chars: &[(usize, char)], start: usize, out: &mut String) -> usize {
    let quote = chars[start].1;
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i].1;
        match c {
            '\\' => {
                if let Some(&(_, next)) = chars.get(i + 1) {
                    if next == '\'' {
                        out.push('\'');
                    } else {
                        out.push('\\');
                        out.push(next);
                    }
                }
                i += 2;
                continue;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
        i += 1;
    }
    // Unterminated string at end of input.
    out.push('"');
    i
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed = out.trim_end().len();
    if out[..trimmed].ends_with(',') {
        out.truncate(trimmed - 1);
    }
}

fn next_significant(chars: &[(usize, char)], from: usize) -> Option<char> {
    chars[from..]
        .iter()
        .map(|(_, c)| *c)
        .find(|c| !c.is_whitespace())
}

fn push_quoted(out: &mut String, word: &str) {
    out.push('"');
    out.push_str(word);
    out.push('"');
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-')
}
