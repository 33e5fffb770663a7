//! Embedding Attribution Score — the closed-form default path.
//!
//! For memory embeddings φᵢ, query embedding q, response embedding r:
//!
//! ```text
//! rawᵢ = max(cos(φᵢ, r), 0) · max(cos(φᵢ, q), 0)
//! aᵢ   = rawᵢ / Σⱼ rawⱼ        (1/k when the total is zero)
//! ```
//!
//! Negative cosines clamp to zero: a memory pointing away from the query or
//! response is irrelevant, not anti-evidence. Output order matches input
//! order; no oracle calls; O(k·d).

use hindsight_core::errors::{AttributionError, HindsightResult};
use hindsight_vector::cosine;

/// Normalized attribution over the retrieved set.
///
/// Scores are non-negative and sum to 1 (uniform when every raw score is
/// zero). Fails with `EmptyRetrievedSet` on an empty slice and
/// `DimensionMismatch` if any embedding disagrees with q/r.
pub fn score(memories: &[Vec<f32>], query: &[f32], response: &[f32]) -> HindsightResult<Vec<f64>> {
    if memories.is_empty() {
        return Err(AttributionError::EmptyRetrievedSet.into());
    }

    let mut raw = Vec::with_capacity(memories.len());
    for phi in memories {
        let to_response = cosine(phi, response)?.max(0.0);
        let to_query = cosine(phi, query)?.max(0.0);
        raw.push(to_response * to_query);
    }

    let total: f64 = raw.iter().sum();
    if total == 0.0 {
        let uniform = 1.0 / memories.len() as f64;
        return Ok(vec![uniform; memories.len()]);
    }

    Ok(raw.into_iter().map(|r| r / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_an_error() {
        assert!(score(&[], &[1.0, 0.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn scores_sum_to_one() {
        let memories = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.7, 0.7, 0.0, 0.0],
        ];
        let q = hindsight_vector::normalize(&[0.6, 0.8, 0.0, 0.0]);
        let r = hindsight_vector::normalize(&[0.5, 0.9, 0.1, 0.0]);
        let a = score(&memories, &q, &r).unwrap();
        let sum: f64 = a.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(a.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn all_orthogonal_yields_uniform() {
        let memories = vec![vec![0.0, 0.0, 1.0], vec![0.0, 0.0, -1.0]];
        let q = [1.0, 0.0, 0.0];
        let r = [0.0, 1.0, 0.0];
        let a = score(&memories, &q, &r).unwrap();
        assert_eq!(a, vec![0.5, 0.5]);
    }

    #[test]
    fn negative_cosine_clamps_to_irrelevance() {
        // Second memory points away from both q and r.
        let memories = vec![vec![1.0, 0.0], vec![-1.0, 0.0]];
        let q = [1.0, 0.0];
        let r = [1.0, 0.0];
        let a = score(&memories, &q, &r).unwrap();
        assert!((a[0] - 1.0).abs() < 1e-12);
        assert_eq!(a[1], 0.0);
    }
}
