// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cosine similarity and vector pooling.

/// Cosine similarity of two equal-length vectors, in `[-1, 1]`.
///
/// Returns 0.0 if either vector has zero norm, if the lengths differ, or if
/// the result is not finite. Never panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Element-wise mean of a batch of equal-length vectors.
///
/// Returns `None` for an empty batch, empty vectors, or ragged lengths.
pub fn pool_embeddings(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = vectors.first()?.len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut pooled = vec![0.0f32; dim];
    for vector in vectors {
        for (sum, value) in pooled.iter_mut().zip(vector) {
            *sum += value;
        }
    }
    let count = vectors.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    Some(pooled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_yields_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn mismatched_or_empty_yields_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn pool_takes_elementwise_mean() {
        let pooled = pool_embeddings(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert!((pooled[0] - 3.0).abs() < f32::EPSILON);
        assert!((pooled[1] - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pool_single_vector_is_identity() {
        assert_eq!(pool_embeddings(&[vec![0.5, -0.5]]), Some(vec![0.5, -0.5]));
    }

    #[test]
    fn pool_rejects_empty_and_ragged() {
        assert_eq!(pool_embeddings(&[]), None);
        assert_eq!(pool_embeddings(&[vec![]]), None);
        assert_eq!(pool_embeddings(&[vec![1.0], vec![1.0, 2.0]]), None);
    }

    fn vector_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
        (1usize..32).prop_flat_map(|len| {
            (
                prop::collection::vec(-100.0f32..100.0, len),
                prop::collection::vec(-100.0f32..100.0, len),
            )
        })
    }

    proptest! {
        #[test]
        fn symmetric((a, b) in vector_pair()) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }

        #[test]
        fn bounded_and_finite((a, b) in vector_pair()) {
            let s = cosine_similarity(&a, &b);
            prop_assert!(s.is_finite());
            prop_assert!((-1.0..=1.0).contains(&s));
        }

        #[test]
        fn self_similarity_is_one(a in prop::collection::vec(0.01f32..100.0, 1..32)) {
            prop_assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-4);
        }

        #[test]
        fn zeros_never_nan(len in 1usize..32, b in prop::collection::vec(-10.0f32..10.0, 32)) {
            let zeros = vec![0.0f32; len];
            prop_assert_eq!(cosine_similarity(&zeros, &b[..len]), 0.0);
        }
    }
}
