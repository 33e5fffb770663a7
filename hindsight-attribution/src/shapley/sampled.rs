//! TMC-Shapley: Monte-Carlo permutation sampling.
//!
//! Each sampled permutation is walked front to back, accumulating the
//! marginal contribution v(S ∪ {i}) − v(S) for the memory joining at each
//! step. Per-memory marginals feed a Welford accumulator; the reported
//! confidence is 1/(1 + σ̂/√m) where σ̂ is the sample standard deviation of
//! that memory's marginals and m the permutations actually walked.
//!
//! Results are always approximate and must be labeled as such downstream.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, warn};

use hindsight_core::config::{AttributionConfig, ShapleyConfig};
use hindsight_core::errors::{AttributionError, HindsightResult};
use hindsight_core::traits::ValueFunction;
use hindsight_profile::Welford;

use crate::deadline::Deadline;
use crate::retry;

/// Permutations evaluated between deadline checks.
const BATCH: usize = 8;

/// Outcome of a TMC-Shapley run.
#[derive(Debug, Clone)]
pub struct SampledShapley {
    /// Mean marginal contribution per memory, in index order.
    pub phi: Vec<f64>,
    /// Per-memory sampling confidence in [0, 1].
    pub confidence: Vec<f64>,
    /// Permutations actually walked.
    pub samples: usize,
    /// True when the deadline or oracle failures cut sampling short.
    pub degraded: bool,
}

/// Monte-Carlo Shapley over k memories with `cfg.mc_samples` permutations.
///
/// On deadline elapse the current running means are returned with the
/// confidence the smaller sample supports. Oracle exhaustion on a
/// permutation drops that permutation and zeroes confidence.
pub fn sampled(
    k: usize,
    v: &dyn ValueFunction,
    cfg: &ShapleyConfig,
    attr_cfg: &AttributionConfig,
    seed: u64,
    deadline: Deadline,
) -> HindsightResult<SampledShapley> {
    if k == 0 {
        return Err(AttributionError::EmptyRetrievedSet.into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let base: Vec<usize> = (0..k).collect();

    // Pre-draw every permutation so parallel evaluation stays deterministic
    // for a given seed.
    let permutations: Vec<Vec<usize>> = (0..cfg.mc_samples.max(1))
        .map(|_| {
            let mut p = base.clone();
            p.shuffle(&mut rng);
            p
        })
        .collect();

    let mut per_memory: Vec<Welford> = vec![Welford::new(); k];
    let mut oracle_failed = false;
    let mut deadline_hit = false;

    for batch in permutations.chunks(BATCH) {
        if deadline.expired() {
            deadline_hit = true;
            break;
        }

        let walked: Vec<HindsightResult<Vec<(usize, f64)>>> = batch
            .par_iter()
            .map(|perm| walk_permutation(perm, v, attr_cfg))
            .collect();

        for outcome in walked {
            match outcome {
                Ok(marginals) => {
                    for (memory, marginal) in marginals {
                        per_memory[memory].push(marginal);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "permutation dropped after oracle retries");
                    oracle_failed = true;
                }
            }
        }
    }

    let samples = per_memory.first().map(|w| w.count as usize).unwrap_or(0);
    let phi: Vec<f64> = per_memory.iter().map(|w| w.mean).collect();

    let confidence: Vec<f64> = if oracle_failed || samples == 0 {
        vec![0.0; k]
    } else {
        let m_sqrt = (samples as f64).sqrt();
        per_memory
            .iter()
            .map(|w| {
                let sigma = w.stddev().unwrap_or(0.0);
                1.0 / (1.0 + sigma / m_sqrt)
            })
            .collect()
    };

    debug!(k, samples, deadline_hit, oracle_failed, "sampled shapley complete");

    Ok(SampledShapley {
        phi,
        confidence,
        samples,
        degraded: deadline_hit || oracle_failed,
    })
}

/// Walk one permutation, returning (memory index, marginal) pairs.
fn walk_permutation(
    perm: &[usize],
    v: &dyn ValueFunction,
    attr_cfg: &AttributionConfig,
) -> HindsightResult<Vec<(usize, f64)>> {
    let mut coalition: Vec<usize> = Vec::with_capacity(perm.len());
    let mut prev = retry::with_backoff(attr_cfg.oracle_max_attempts, attr_cfg.oracle_backoff_base_ms, || {
        v.value(&coalition)
    })?;

    let mut marginals = Vec::with_capacity(perm.len());
    for &member in perm {
        coalition.push(member);
        coalition.sort_unstable();
        let with_member = retry::with_backoff(
            attr_cfg.oracle_max_attempts,
            attr_cfg.oracle_backoff_base_ms,
            || v.value(&coalition),
        )?;
        marginals.push((member, with_member - prev));
        prev = with_member;
    }
    Ok(marginals)
}
