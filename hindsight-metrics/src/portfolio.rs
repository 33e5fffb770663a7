//! Pure portfolio metric functions. Inputs are slices; nothing here touches
//! storage.

use uuid::Uuid;

use hindsight_core::models::RedundantPair;
use hindsight_core::HindsightResult;

/// Daily token cost of holding one memory in the retrieval set:
/// tokens · price_in · queries_per_day.
pub fn memory_token_cost(token_count: u32, input_token_cost: f64, queries_per_day: f64) -> f64 {
    token_count as f64 * input_token_cost * queries_per_day
}

/// Token Waste Rate: share of retrieved tokens spent on memories whose
/// |score| sits below the threshold, as a percent. Zero on empty input.
pub fn token_waste_rate(token_scores: &[(u32, f64)], score_threshold: f64) -> f64 {
    let total: u64 = token_scores.iter().map(|&(t, _)| t as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let wasted: u64 = token_scores
        .iter()
        .filter(|&&(_, score)| score.abs() < score_threshold)
        .map(|&(t, _)| t as u64)
        .sum();
    wasted as f64 / total as f64 * 100.0
}

/// Memory ROI: (mean attribution / monthly token cost) · 1000.
/// Zero-cost memories report zero rather than infinity.
pub fn memory_roi(mean_attribution: f64, monthly_token_cost: f64) -> f64 {
    if monthly_token_cost == 0.0 {
        return 0.0;
    }
    mean_attribution / monthly_token_cost * 1000.0
}

/// All memory pairs whose cosine similarity exceeds the threshold, charged
/// min(tokens) each.
pub fn redundancy_pairs(
    memories: &[(Uuid, u32, Vec<f32>)],
    similarity_threshold: f64,
) -> HindsightResult<Vec<RedundantPair>> {
    let mut pairs = Vec::new();
    for i in 0..memories.len() {
        for j in (i + 1)..memories.len() {
            let (id_a, tokens_a, ref emb_a) = memories[i];
            let (id_b, tokens_b, ref emb_b) = memories[j];
            if emb_a.is_empty() || emb_b.is_empty() || emb_a.len() != emb_b.len() {
                continue;
            }
            let similarity = hindsight_vector::cosine(emb_a, emb_b)?;
            if similarity > similarity_threshold {
                pairs.push(RedundantPair {
                    memory_a: id_a,
                    memory_b: id_b,
                    similarity,
                    overlap_tokens: tokens_a.min(tokens_b),
                });
            }
        }
    }
    Ok(pairs)
}

/// Monthly cost of the redundant overlap:
/// Σ overlap_tokens · price · queries_per_day · 30 · co_retrieval_rate.
pub fn redundancy_tax(
    pairs: &[RedundantPair],
    input_token_cost: f64,
    queries_per_day: f64,
    co_retrieval_rate: f64,
) -> f64 {
    let overlap: u64 = pairs.iter().map(|p| p.overlap_tokens as u64).sum();
    overlap as f64 * input_token_cost * queries_per_day * 30.0 * co_retrieval_rate
}

/// Relative quality lift of retrieval, percent:
/// (mean(with) − mean(without)) / mean(without) · 100.
/// Zero when either side is empty or the baseline mean is zero.
pub fn accuracy_delta(scores_with: &[f64], scores_without: &[f64]) -> f64 {
    if scores_with.is_empty() || scores_without.is_empty() {
        return 0.0;
    }
    let mean_with = scores_with.iter().sum::<f64>() / scores_with.len() as f64;
    let mean_without = scores_without.iter().sum::<f64>() / scores_without.len() as f64;
    if mean_without == 0.0 {
        return 0.0;
    }
    (mean_with - mean_without) / mean_without * 100.0
}

/// Gini coefficient: Σᵢⱼ|xᵢ − xⱼ| / (2n²·mean). Zero on empty input or
/// zero mean.
pub fn gini(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    let mean = xs.iter().sum::<f64>() / n as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let mut abs_diff_sum = 0.0;
    for &a in xs {
        for &b in xs {
            abs_diff_sum += (a - b).abs();
        }
    }
    abs_diff_sum / (2.0 * (n * n) as f64 * mean)
}

/// Signal-to-noise ratio in dB over positive vs non-positive score energy.
/// The ε regularizer on both sides keeps the result finite for every input,
/// including empty and all-negative score sets.
pub fn snr_db(xs: &[f64]) -> f64 {
    const EPSILON: f64 = 1e-10;
    let signal: f64 = xs.iter().filter(|&&x| x > 0.0).map(|x| x * x).sum();
    let noise: f64 = xs.iter().filter(|&&x| x <= 0.0).map(|x| x * x).sum();
    10.0 * ((signal + EPSILON) / (noise + EPSILON)).log10()
}

/// Contradiction risk: 1 − Π(1 − pᵢⱼ) over pairwise contradiction
/// probabilities (clamped to [0, 1]).
pub fn contradiction_risk(probabilities: &[f64]) -> f64 {
    let survival: f64 = probabilities
        .iter()
        .map(|p| 1.0 - p.clamp(0.0, 1.0))
        .product();
    1.0 - survival
}

/// Staleness index: among memories accessed within the frequent window,
/// the percent created earlier than the staleness window. Each element is
/// (days since created, days since last access).
pub fn staleness_index(
    age_access_days: &[(i64, i64)],
    frequent_access_days: i64,
    staleness_window_days: i64,
) -> f64 {
    let frequent: Vec<_> = age_access_days
        .iter()
        .filter(|&&(_, accessed)| accessed <= frequent_access_days)
        .collect();
    if frequent.is_empty() {
        return 0.0;
    }
    let stale = frequent
        .iter()
        .filter(|&&&(age, _)| age > staleness_window_days)
        .count();
    stale as f64 / frequent.len() as f64 * 100.0
}
