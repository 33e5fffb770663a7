//! L1-regularized linear fit by coordinate descent.
//!
//! Minimizes ||y − Zw||² + λ·||w||₁ with per-coordinate soft-thresholding:
//!
//! ```text
//! ρⱼ = Σᵢ zᵢⱼ · (yᵢ − Σ_{l≠j} zᵢₗ wₗ)
//! wⱼ ← soft(ρⱼ; λ·n) / zzⱼ          (0 when zzⱼ = 0)
//! ```
//!
//! Terminates when Σ|Δwⱼ| < tol or after max_iter sweeps. A design matrix
//! whose columns are all zero yields zero weights, not an error.

/// Coordinate-descent LASSO over an n×k design matrix `z` (rows = samples).
///
/// `z.len()` must equal `y.len()`; every row must have `k` entries.
pub fn fit(z: &[Vec<f64>], y: &[f64], lambda: f64, tol: f64, max_iter: usize) -> Vec<f64> {
    let n = z.len();
    if n == 0 {
        return Vec::new();
    }
    let k = z[0].len();
    if k == 0 {
        return Vec::new();
    }

    // Column squared norms; zzⱼ = 0 columns stay at weight 0.
    let mut zz = vec![0.0f64; k];
    for row in z {
        for (j, &v) in row.iter().enumerate() {
            zz[j] += v * v;
        }
    }

    let mut w = vec![0.0f64; k];
    // Residual r = y − Zw; starts at y since w = 0.
    let mut residual = y.to_vec();
    let threshold = lambda * n as f64;

    for _ in 0..max_iter {
        let mut total_delta = 0.0;

        for j in 0..k {
            if zz[j] == 0.0 {
                continue;
            }

            // ρⱼ over the residual with coordinate j added back.
            let mut rho = 0.0;
            for i in 0..n {
                rho += z[i][j] * (residual[i] + z[i][j] * w[j]);
            }

            let updated = soft_threshold(rho, threshold) / zz[j];
            let delta = updated - w[j];
            if delta != 0.0 {
                for i in 0..n {
                    residual[i] -= z[i][j] * delta;
                }
            }
            w[j] = updated;
            total_delta += delta.abs();
        }

        if total_delta < tol {
            break;
        }
    }

    w
}

/// sign(ρ)·max(|ρ|−t, 0)
fn soft_threshold(rho: f64, t: f64) -> f64 {
    if rho > t {
        rho - t
    } else if rho < -t {
        rho + t
    } else {
        0.0
    }
}
