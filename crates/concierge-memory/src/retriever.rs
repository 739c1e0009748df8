// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-match semantic retrieval over embedded corpora.
//!
//! Record matching uses a similarity threshold. Grounding lookup always
//! returns the best chunk, or the first chunk if nothing can be scored.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::client::EmbeddingClient;
use crate::corpus::{Corpus, DomainRecord, GroundingChunk};
use crate::vector::cosine_similarity;

/// A corpus entry selected by retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch<'a, T> {
    pub record: &'a T,
    pub index: usize,
    /// `None` when the entry was chosen as a fallback without scoring.
    pub score: Option<f32>,
}

/// How a best match is turned into a result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrievalPolicy {
    /// Return the best entry only if its score is at least the threshold.
    Threshold(f32),
    /// Return the best entry regardless of score, falling back to the first entry.
    AlwaysBest,
}

impl RetrievalPolicy {
    /// Applies the policy to an optional query vector.
    ///
    /// With no vector (embedding unavailable), `Threshold` yields `None` and
    /// `AlwaysBest` yields the first corpus entry.
    pub fn select<'a, T>(
        &self,
        query: Option<&[f32]>,
        corpus: &'a Corpus<T>,
    ) -> Option<ScoredMatch<'a, T>> {
        let best = query.and_then(|q| {
            let threshold = match self {
                Self::Threshold(t) => Some(*t),
                Self::AlwaysBest => None,
            };
            find_best_match(q, corpus, threshold)
        });

        match (self, best) {
            (_, Some(found)) => Some(found),
            (Self::Threshold(_), None) => None,
            (Self::AlwaysBest, None) => corpus.first().map(|entry| ScoredMatch {
                record: &entry.record,
                index: 0,
                score: None,
            }),
        }
    }
}

/// Finds the entry most similar to `query`.
///
/// Entries without a vector, or whose vector length differs from the
/// query's, are skipped. Ties keep the earlier entry. With a threshold, the
/// best entry is returned only if its score is `>= threshold`.
pub fn find_best_match<'a, T>(
    query: &[f32],
    corpus: &'a Corpus<T>,
    threshold: Option<f32>,
) -> Option<ScoredMatch<'a, T>> {
    let mut best: Option<(usize, f32)> = None;

    for (index, entry) in corpus.iter().enumerate() {
        let Some(vector) = entry.embedding.as_deref() else {
            continue;
        };
        if vector.len() != query.len() {
            trace!(index, dim = vector.len(), expected = query.len(), "skipping mismatched vector");
            continue;
        }
        let score = cosine_similarity(query, vector);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    let (index, score) = best?;
    if threshold.is_some_and(|t| score < t) {
        debug!(index, score, ?threshold, "best match below threshold");
        return None;
    }

    corpus.get(index).map(|entry| ScoredMatch {
        record: &entry.record,
        index,
        score: Some(score),
    })
}

/// Embeds queries and retrieves from the record and grounding corpora.
pub struct SemanticRetriever {
    client: EmbeddingClient,
    records: Arc<Corpus<DomainRecord>>,
    grounding: Arc<Corpus<GroundingChunk>>,
    record_policy: RetrievalPolicy,
}

impl SemanticRetriever {
    pub fn new(
        client: EmbeddingClient,
        records: Arc<Corpus<DomainRecord>>,
        grounding: Arc<Corpus<GroundingChunk>>,
        record_threshold: f32,
    ) -> Self {
        Self {
            client,
            records,
            grounding,
            record_policy: RetrievalPolicy::Threshold(record_threshold),
        }
    }

    /// Embeds free text; `None` when the embedding provider is unavailable.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        self.client.embed(text).await
    }

    /// Best grounding chunk for the query, or the first chunk as fallback.
    pub fn grounding_for(&self, query: Option<&[f32]>) -> Option<ScoredMatch<'_, GroundingChunk>> {
        RetrievalPolicy::AlwaysBest.select(query, &self.grounding)
    }

    /// Best record above the match threshold, if any.
    pub fn record_for(&self, query: Option<&[f32]>) -> Option<ScoredMatch<'_, DomainRecord>> {
        self.record_policy.select(query, &self.records)
    }

    pub fn records(&self) -> &Corpus<DomainRecord> {
        &self.records
    }

    pub fn grounding(&self) -> &Corpus<GroundingChunk> {
        &self.grounding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::EmbeddedRecord;

    fn corpus(vectors: Vec<Option<Vec<f32>>>) -> Corpus<&'static str> {
        const NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| EmbeddedRecord::new(NAMES[i], v))
            .collect()
    }

    #[test]
    fn mismatched_dimension_is_never_selected() {
        let corpus = corpus(vec![
            Some(vec![0.0, 1.0, 0.0]),
            Some(vec![0.5, 0.5, 0.0]),
            Some(vec![1.0, 0.0, 0.0, 0.0]),
            Some(vec![0.9, 0.1, 0.0]),
        ]);
        let query = [1.0, 0.0, 0.0];
        let best = find_best_match(&query, &corpus, None).unwrap();
        assert_eq!(*best.record, "d");
        assert_eq!(best.index, 3);
    }

    #[test]
    fn only_mismatched_entries_yields_none() {
        let corpus = corpus(vec![Some(vec![1.0]), None]);
        assert!(find_best_match(&[1.0, 0.0], &corpus, None).is_none());
    }

    #[test]
    fn below_threshold_is_none() {
        // cos([1,0], [0.3, ~0.954]) = 0.3
        let corpus = corpus(vec![Some(vec![0.3, (1.0f32 - 0.09).sqrt()])]);
        let query = [1.0, 0.0];
        assert!(find_best_match(&query, &corpus, Some(0.5)).is_none());
        let found = find_best_match(&query, &corpus, None).unwrap();
        assert!((found.score.unwrap() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn threshold_is_inclusive() {
        let corpus = corpus(vec![Some(vec![1.0, 0.0])]);
        assert!(find_best_match(&[1.0, 0.0], &corpus, Some(1.0)).is_some());
    }

    #[test]
    fn ties_keep_first_entry() {
        let corpus = corpus(vec![Some(vec![1.0, 0.0]), Some(vec![2.0, 0.0])]);
        let best = find_best_match(&[1.0, 0.0], &corpus, None).unwrap();
        assert_eq!(best.index, 0);
    }

    #[test]
    fn threshold_policy_without_query_is_none() {
        let corpus = corpus(vec![Some(vec![1.0])]);
        assert!(RetrievalPolicy::Threshold(0.5).select(None, &corpus).is_none());
    }

    #[test]
    fn always_best_without_query_is_first_entry() {
        let corpus = corpus(vec![Some(vec![1.0]), Some(vec![0.5])]);
        let chosen = RetrievalPolicy::AlwaysBest.select(None, &corpus).unwrap();
        assert_eq!(*chosen.record, "a");
        assert_eq!(chosen.score, None);
    }

    #[test]
    fn always_best_returns_weak_match() {
        let corpus = corpus(vec![Some(vec![0.0, 1.0]), Some(vec![0.1, 1.0])]);
        let chosen = RetrievalPolicy::AlwaysBest
            .select(Some(&[1.0, 0.0]), &corpus)
            .unwrap();
        assert_eq!(*chosen.record, "b");
        assert!(chosen.score.unwrap() < 0.2);
    }

    #[test]
    fn always_best_falls_back_when_nothing_scores() {
        let corpus = corpus(vec![None, Some(vec![1.0, 2.0, 3.0])]);
        let chosen = RetrievalPolicy::AlwaysBest
            .select(Some(&[1.0]), &corpus)
            .unwrap();
        assert_eq!(chosen.index, 0);
    }

    #[test]
    fn empty_corpus_yields_none_for_both_policies() {
        let corpus: Corpus<&str> = Corpus::default();
        assert!(RetrievalPolicy::AlwaysBest.select(Some(&[1.0]), &corpus).is_none());
        assert!(RetrievalPolicy::Threshold(0.0).select(Some(&[1.0]), &corpus).is_none());
    }
}
