//! ContextCite: ablation-based attribution with a sparse linear surrogate.
//!
//! 1. Generate n ablation masks over the k retrieved memories. Row 0 is
//!    all-zeros, row 1 all-ones, the rest i.i.d. Bernoulli(½).
//! 2. Score each masked context with the `LogProb` oracle (fanned out with
//!    rayon; per-call retry with exponential backoff).
//! 3. Fit LASSO weights on (Z, y), centered so the base log-probability is
//!    absorbed by an implicit intercept rather than the weights.
//! 4. Report the Linear Datamodeling Score — Pearson correlation between
//!    Zw and y — as the surrogate's self-confidence.
//!
//! Oracle outputs are already log-probabilities; no transform is applied
//! before the regression.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use hindsight_core::config::{AttributionConfig, ContextCiteConfig};
use hindsight_core::errors::{AttributionError, HindsightResult};
use hindsight_core::traits::LogProb;

use crate::deadline::Deadline;
use crate::{lasso, retry};

/// Outcome of one ContextCite run.
#[derive(Debug, Clone)]
pub struct ContextCiteResult {
    /// Per-memory surrogate weights, in snapshot order.
    pub weights: Vec<f64>,
    /// Linear Datamodeling Score: the surrogate's self-confidence.
    pub lds: f64,
    pub oracle_calls: u32,
    /// True when the run lost masks to the deadline or oracle exhaustion.
    pub degraded: bool,
}

/// Run ContextCite over `memory_contents` (snapshot order).
///
/// `seed` makes mask generation deterministic so two scoring paths over the
/// same inputs produce identical results.
pub fn run(
    query: &str,
    response: &str,
    memory_contents: &[&str],
    oracle: &dyn LogProb,
    cfg: &ContextCiteConfig,
    attr_cfg: &AttributionConfig,
    seed: u64,
    deadline: Deadline,
) -> HindsightResult<ContextCiteResult> {
    let k = memory_contents.len();
    if k == 0 {
        return Err(AttributionError::EmptyRetrievedSet.into());
    }

    let masks = generate_masks(k, cfg.num_samples, seed);

    // Oracle phase. A mask drops out when the deadline expires before its
    // task starts, or when its retry budget exhausts.
    enum MaskOutcome {
        Scored(usize, f64),
        DeadlineSkipped,
        Exhausted,
    }

    let outcomes: Vec<MaskOutcome> = masks
        .par_iter()
        .enumerate()
        .map(|(row, mask)| {
            if deadline.expired() {
                return MaskOutcome::DeadlineSkipped;
            }
            let context: Vec<&str> = mask
                .iter()
                .enumerate()
                .filter(|(_, &included)| included)
                .map(|(i, _)| memory_contents[i])
                .collect();
            match retry::with_backoff(attr_cfg.oracle_max_attempts, attr_cfg.oracle_backoff_base_ms, || {
                oracle.log_prob(query, response, &context)
            }) {
                Ok(y) => MaskOutcome::Scored(row, y),
                Err(e) => {
                    warn!(row, error = %e, "ablation mask dropped");
                    MaskOutcome::Exhausted
                }
            }
        })
        .collect();

    let scored: Vec<(usize, f64)> = outcomes
        .iter()
        .filter_map(|o| match o {
            MaskOutcome::Scored(row, y) => Some((*row, *y)),
            _ => None,
        })
        .collect();
    let exhausted = outcomes.iter().any(|o| matches!(o, MaskOutcome::Exhausted));
    let deadline_hit = outcomes
        .iter()
        .any(|o| matches!(o, MaskOutcome::DeadlineSkipped));
    let oracle_calls = scored.len() as u32;
    let degraded = exhausted || deadline_hit;

    if scored.is_empty() {
        // Nothing to regress on; surface the zero-confidence partial result.
        return Ok(ContextCiteResult {
            weights: vec![0.0; k],
            lds: 0.0,
            oracle_calls: 0,
            degraded: true,
        });
    }

    let z: Vec<Vec<f64>> = scored
        .iter()
        .map(|&(row, _)| masks[row].iter().map(|&b| if b { 1.0 } else { 0.0 }).collect())
        .collect();
    let y: Vec<f64> = scored.iter().map(|&(_, v)| v).collect();

    // Center columns and targets so the base log-probability lands in the
    // implicit intercept instead of leaking into the weights.
    let n_rows = z.len() as f64;
    let col_means: Vec<f64> = (0..k)
        .map(|j| z.iter().map(|row| row[j]).sum::<f64>() / n_rows)
        .collect();
    let y_mean = y.iter().sum::<f64>() / n_rows;
    let z_centered: Vec<Vec<f64>> = z
        .iter()
        .map(|row| row.iter().zip(&col_means).map(|(v, m)| v - m).collect())
        .collect();
    let y_centered: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

    let weights = lasso::fit(
        &z_centered,
        &y_centered,
        cfg.lasso_lambda,
        cfg.lasso_tolerance,
        cfg.lasso_max_iter,
    );

    // Pearson is shift-invariant, so the centered fit scores identically to
    // the intercepted one.
    let predicted: Vec<f64> = z_centered
        .iter()
        .map(|row| row.iter().zip(&weights).map(|(a, b)| a * b).sum())
        .collect();
    let mut lds = pearson(&predicted, &y_centered);

    if exhausted {
        // Retry budget spent on at least one mask: partial result, zero confidence.
        lds = 0.0;
    } else if deadline_hit {
        // Deadline elapse: partial fit, LDS pinned below the threshold.
        lds = lds.min(cfg.min_confidence - f64::EPSILON);
    }

    debug!(k, masks = masks.len(), scored = scored.len(), lds, "contextcite run complete");

    Ok(ContextCiteResult {
        weights,
        lds,
        oracle_calls,
        degraded,
    })
}

/// Ablation masks: all-zeros, all-ones, then Bernoulli(½) rows.
fn generate_masks(k: usize, num_samples: usize, seed: u64) -> Vec<Vec<bool>> {
    let n = num_samples.max(2);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut masks = Vec::with_capacity(n);
    masks.push(vec![false; k]);
    masks.push(vec![true; k]);
    for _ in 2..n {
        masks.push((0..k).map(|_| rng.gen_bool(0.5)).collect());
    }
    masks
}

/// Pearson correlation; 0.0 when either side has zero variance.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}
