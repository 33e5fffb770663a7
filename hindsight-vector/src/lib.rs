//! # hindsight-vector
//!
//! Vector math kernel under every attribution path: dot products, cosine
//! similarity, normalization. Sums over vectors of 256 dimensions or more
//! use Kahan compensated summation; shorter vectors use the naive loop.
//!
//! Cosine returns 0.0 when either operand has zero norm, so downstream
//! score math never sees a NaN.

use hindsight_core::errors::{AttributionError, HindsightResult};

/// Dimension at which summation switches to the compensated form.
const KAHAN_THRESHOLD: usize = 256;

fn check_dims(a: &[f32], b: &[f32]) -> HindsightResult<()> {
    if a.len() != b.len() {
        return Err(AttributionError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        }
        .into());
    }
    Ok(())
}

/// Kahan compensated sum of an f64 term stream.
fn kahan_sum(terms: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0f64;
    let mut c = 0.0f64;
    for term in terms {
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Dot product. Accumulates in f64; compensated for d >= 256.
pub fn dot(a: &[f32], b: &[f32]) -> HindsightResult<f64> {
    check_dims(a, b)?;
    let terms = a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64);
    if a.len() >= KAHAN_THRESHOLD {
        Ok(kahan_sum(terms))
    } else {
        Ok(terms.sum())
    }
}

/// Euclidean norm.
pub fn norm(v: &[f32]) -> f64 {
    let terms = v.iter().map(|&x| x as f64 * x as f64);
    let sq = if v.len() >= KAHAN_THRESHOLD {
        kahan_sum(terms)
    } else {
        terms.sum()
    };
    sq.sqrt()
}

/// Cosine similarity. Returns 0.0 when either operand has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> HindsightResult<f64> {
    check_dims(a, b)?;
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok(dot(a, b)? / (na * nb))
}

/// Normalize to unit length. A zero vector normalizes to itself.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = norm(v);
    if n == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|&x| (x as f64 / n) as f32).collect()
}

/// Whether a vector is unit-norm within `tol`.
pub fn is_unit_norm(v: &[f32], tol: f64) -> bool {
    (norm(v) - 1.0).abs() <= tol
}
