//! Exact Shapley values by full subset enumeration.
//!
//! For each memory i and each subset S not containing i:
//!
//! ```text
//! φᵢ += (|S|! · (k−|S|−1)! / k!) · (v(S ∪ {i}) − v(S))
//! ```
//!
//! The value function is evaluated once per subset bitmask (2^k calls,
//! fanned out with rayon) and memoized before the weighted sums run.
//! Rejects k over the configured bound; fails hard on deadline elapse.

use rayon::prelude::*;
use tracing::debug;

use hindsight_core::config::{AttributionConfig, ShapleyConfig};
use hindsight_core::errors::{AttributionError, HindsightResult};
use hindsight_core::traits::ValueFunction;

use crate::deadline::Deadline;
use crate::retry;

/// Exact Shapley values for k memories. Output order matches index order.
pub fn exact(
    k: usize,
    v: &dyn ValueFunction,
    cfg: &ShapleyConfig,
    attr_cfg: &AttributionConfig,
    deadline: Deadline,
) -> HindsightResult<Vec<f64>> {
    if k == 0 {
        return Err(AttributionError::EmptyRetrievedSet.into());
    }
    if k > cfg.max_exact_k {
        return Err(AttributionError::InfeasibleExactShapley {
            k,
            max: cfg.max_exact_k,
        }
        .into());
    }

    let subsets: u64 = 1 << k;

    // Memoize v over every bitmask. Exact enumeration cannot be partial, so
    // a deadline hit anywhere fails the whole call.
    let values: Vec<HindsightResult<f64>> = (0..subsets)
        .into_par_iter()
        .map(|mask| {
            if deadline.expired() {
                return Err(AttributionError::DeadlineExceeded {
                    phase: "exact shapley enumeration".into(),
                }
                .into());
            }
            let members = mask_to_indices(mask, k);
            retry::with_backoff(
                attr_cfg.oracle_max_attempts,
                attr_cfg.oracle_backoff_base_ms,
                || v.value(&members),
            )
            .map_err(Into::into)
        })
        .collect();

    let mut table = Vec::with_capacity(subsets as usize);
    for value in values {
        table.push(value?);
    }

    // k! weights via a factorial table; f64 is exact up to 18!.
    let fact: Vec<f64> = {
        let mut f = vec![1.0f64; k + 1];
        for i in 1..=k {
            f[i] = f[i - 1] * i as f64;
        }
        f
    };
    let k_fact = fact[k];

    let mut phi = vec![0.0f64; k];
    for i in 0..k {
        let bit = 1u64 << i;
        for mask in 0..subsets {
            if mask & bit != 0 {
                continue;
            }
            let s = (mask as u32).count_ones() as usize;
            let weight = fact[s] * fact[k - s - 1] / k_fact;
            phi[i] += weight * (table[(mask | bit) as usize] - table[mask as usize]);
        }
    }

    debug!(k, evaluations = subsets, "exact shapley complete");
    Ok(phi)
}

/// Ascending member indices of a subset bitmask.
fn mask_to_indices(mask: u64, k: usize) -> Vec<usize> {
    (0..k).filter(|&i| mask & (1 << i) != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::HindsightResult;

    struct AdditiveValue(Vec<f64>);

    impl ValueFunction for AdditiveValue {
        fn value(&self, subset: &[usize]) -> HindsightResult<f64> {
            Ok(subset.iter().map(|&i| self.0[i]).sum())
        }
    }

    #[test]
    fn additive_game_gives_individual_values() {
        // For an additive game, φᵢ is exactly the individual contribution.
        let v = AdditiveValue(vec![0.5, 0.3, 0.2]);
        let phi = exact(
            3,
            &v,
            &ShapleyConfig::default(),
            &AttributionConfig::default(),
            Deadline::none(),
        )
        .unwrap();
        assert!((phi[0] - 0.5).abs() < 1e-12);
        assert!((phi[1] - 0.3).abs() < 1e-12);
        assert!((phi[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_k_above_bound() {
        let v = AdditiveValue(vec![0.0; 16]);
        let err = exact(
            16,
            &v,
            &ShapleyConfig::default(),
            &AttributionConfig::default(),
            Deadline::none(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("infeasible"));
    }

    #[test]
    fn empty_set_is_an_error() {
        let v = AdditiveValue(vec![]);
        assert!(exact(
            0,
            &v,
            &ShapleyConfig::default(),
            &AttributionConfig::default(),
            Deadline::none(),
        )
        .is_err());
    }

    #[test]
    fn deadline_fails_hard() {
        let v = AdditiveValue(vec![0.1, 0.2]);
        let err = exact(
            2,
            &v,
            &ShapleyConfig::default(),
            &AttributionConfig::default(),
            Deadline::after(std::time::Duration::ZERO),
        )
        .unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn mask_to_indices_ascending() {
        assert_eq!(mask_to_indices(0b1011, 4), vec![0, 1, 3]);
        assert_eq!(mask_to_indices(0, 4), Vec::<usize>::new());
    }
}
