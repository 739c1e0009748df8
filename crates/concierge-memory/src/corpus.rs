// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded record corpora loaded from JSON.
//!
//! Two corpora are used: domain records (property listings) and grounding
//! chunks (agency facts). Both files are JSON arrays whose objects carry an
//! `embedding` array next to the record fields. A corpus is loaded once and
//! shared read-only behind an `Arc` for the life of the process.

use std::path::Path;

use concierge_core::ConciergeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// A property listing recommended to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub rooms: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_agent: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub built_year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub monthly_costs: Option<String>,
    #[serde(default)]
    pub special_note: Option<String>,
}

impl DomainRecord {
    /// One-line description injected into the prompt as a match.
    pub fn headline(&self) -> String {
        format!(
            "{} - {} located at {}",
            self.title,
            self.price.as_deref().unwrap_or("price on request"),
            self.address.as_deref().unwrap_or("an undisclosed address")
        )
    }
}

/// A short agency fact used to ground replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub section: String,
    pub text: String,
}

/// A record paired with its (possibly missing) embedding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddedRecord<T> {
    #[serde(flatten)]
    pub record: T,
    /// `None` when the source had no vector or a non-numeric one.
    #[serde(default, deserialize_with = "lenient_vector")]
    pub embedding: Option<Vec<f32>>,
}

impl<T> EmbeddedRecord<T> {
    pub fn new(record: T, embedding: Option<Vec<f32>>) -> Self {
        Self { record, embedding }
    }
}

/// An ordered, read-only collection of embedded records.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus<T> {
    entries: Vec<EmbeddedRecord<T>>,
}

impl<T> Default for Corpus<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Corpus<T> {
    pub fn new(entries: Vec<EmbeddedRecord<T>>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&EmbeddedRecord<T>> {
        self.entries.first()
    }

    pub fn get(&self, index: usize) -> Option<&EmbeddedRecord<T>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddedRecord<T>> {
        self.entries.iter()
    }

    /// Number of entries that carry a vector of the given dimension.
    pub fn searchable(&self, dim: usize) -> usize {
        self.entries
            .iter()
            .filter(|e| e.embedding.as_ref().is_some_and(|v| v.len() == dim))
            .count()
    }
}

impl<T> Corpus<T>
where
    T: for<'de> Deserialize<'de>,
{
    /// Parses a corpus from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, ConciergeError> {
        let entries: Vec<EmbeddedRecord<T>> =
            serde_json::from_str(json).map_err(|e| ConciergeError::Corpus {
                message: "invalid corpus json".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self::new(entries))
    }

    /// Reads and parses a corpus file.
    pub async fn load(path: &Path) -> Result<Self, ConciergeError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConciergeError::Corpus {
                message: format!("cannot read {}", path.display()),
                source: Some(Box::new(e)),
            })?;
        Self::from_json(&json)
    }

    /// Like [`Corpus::load`], but a missing or broken file yields an empty
    /// corpus and a warning.
    pub async fn load_or_empty(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(corpus) => {
                let without_vectors = corpus.iter().filter(|e| e.embedding.is_none()).count();
                info!(
                    path = %path.display(),
                    entries = corpus.len(),
                    without_vectors,
                    "corpus loaded"
                );
                corpus
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corpus unavailable, using empty corpus");
                Self::default()
            }
        }
    }
}

impl<'a, T> IntoIterator for &'a Corpus<T> {
    type Item = &'a EmbeddedRecord<T>;
    type IntoIter = std::slice::Iter<'a, EmbeddedRecord<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T> FromIterator<EmbeddedRecord<T>> for Corpus<T> {
    fn from_iter<I: IntoIterator<Item = EmbeddedRecord<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn lenient_vector<'de, D>(deserializer: D) -> Result<Option<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>(),
        _ => None,
    }))
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const RECORDS: &str = r#"[
        {"title": "Loft in Mitte", "price": 1450, "address": "Torstr. 1, Berlin",
         "features": ["balcony"], "builtYear": 1999, "embedding": [0.1, 0.2, 0.3]},
        {"title": "Office Hafencity", "price": "2.100 EUR", "embedding": null},
        {"title": "Garden flat", "embedding": ["a", "b"]}
    ]"#;

    #[test]
    fn parses_records_with_lenient_fields() {
        let corpus = Corpus::<DomainRecord>::from_json(RECORDS).unwrap();
        assert_eq!(corpus.len(), 3);

        let loft = corpus.get(0).unwrap();
        assert_eq!(loft.record.price.as_deref(), Some("1450"));
        assert_eq!(loft.record.built_year.as_deref(), Some("1999"));
        assert_eq!(loft.embedding.as_deref(), Some(&[0.1f32, 0.2, 0.3][..]));

        let office = corpus.get(1).unwrap();
        assert_eq!(office.record.price.as_deref(), Some("2.100 EUR"));
        assert!(office.embedding.is_none());

        assert!(corpus.get(2).unwrap().embedding.is_none());
        assert_eq!(corpus.searchable(3), 1);
    }

    #[test]
    fn headline_formats_match() {
        let corpus = Corpus::<DomainRecord>::from_json(RECORDS).unwrap();
        assert_eq!(
            corpus.get(0).unwrap().record.headline(),
            "Loft in Mitte - 1450 located at Torstr. 1, Berlin"
        );
    }

    #[test]
    fn parses_grounding_chunks() {
        let json = r#"[{"section": "about", "text": "Founded 1990.", "embedding": [1, 0]}]"#;
        let corpus = Corpus::<GroundingChunk>::from_json(json).unwrap();
        let first = corpus.first().unwrap();
        assert_eq!(first.record.text, "Founded 1990.");
        assert_eq!(first.embedding, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn invalid_json_is_corpus_error() {
        let err = Corpus::<GroundingChunk>::from_json("{not an array}").unwrap_err();
        assert!(matches!(err, ConciergeError::Corpus { .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_file_yields_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::<DomainRecord>::load_or_empty(&dir.path().join("absent.json")).await;
        assert!(corpus.is_empty());
        assert!(logs_contain("corpus unavailable, using empty corpus"));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, RECORDS).unwrap();
        let corpus = Corpus::<DomainRecord>::load(&path).await.unwrap();
        assert_eq!(corpus.len(), 3);
    }
}
