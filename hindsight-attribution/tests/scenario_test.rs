//! End-to-end attribution scenarios with literal inputs.

use hindsight_attribution::{contextcite, eas, lasso, shapley, Deadline};
use hindsight_core::config::{AttributionConfig, ContextCiteConfig, ShapleyConfig};
use hindsight_vector::normalize;
use test_fixtures::{CosineValue, FlakyOracle, LinearOracle};

// ─── EAS on toy 4-d vectors ─────────────────────────────────────────────────

#[test]
fn eas_toy_vectors_rank_by_alignment() {
    let memories = vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0],
    ];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let r = normalize(&[0.5, 0.9, 0.1, 0.0]);

    let a = eas::score(&memories, &q, &r).unwrap();

    let sum: f64 = a.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
    assert!(a.iter().all(|&x| x >= 0.0));
    // m2 aligns best with both q and r; m3 is orthogonal to q.
    assert!(a[1] > a[0], "expected m2 > m1: {a:?}");
    assert!(a[0] > a[2], "expected m1 > m3: {a:?}");
}

// ─── Shapley efficiency on the cosine value function ────────────────────────

#[test]
fn shapley_efficiency_on_cosine_value() {
    let memories = vec![
        normalize(&[1.0, 0.2, 0.0, 0.0]),
        normalize(&[0.3, 1.0, 0.0, 0.0]),
        normalize(&[0.0, 0.0, 1.0, 0.3]),
    ];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let v = CosineValue {
        base: 0.3,
        scale: 0.7,
        memories: memories.clone(),
        query: q.clone(),
    };

    let phi = shapley::exact(
        3,
        &v,
        &ShapleyConfig::default(),
        &AttributionConfig::default(),
        Deadline::none(),
    )
    .unwrap();

    let full: Vec<usize> = (0..3).collect();
    let v_full = hindsight_core::traits::ValueFunction::value(&v, &full).unwrap();
    let v_empty = hindsight_core::traits::ValueFunction::value(&v, &[]).unwrap();
    let total: f64 = phi.iter().sum();
    assert!(
        (total - (v_full - v_empty)).abs() < 1e-6,
        "efficiency violated: {total} vs {}",
        v_full - v_empty
    );
}

// ─── Shapley null player ────────────────────────────────────────────────────

#[test]
fn shapley_null_player_gets_negligible_share() {
    // Fourth memory orthogonal to the query. Under a mean-based value
    // function an orthogonal member still dilutes the coalition mean, so
    // its share is small and negative rather than exactly zero.
    let memories = vec![
        normalize(&[1.0, 0.0, 2.0, 0.0]),
        normalize(&[0.0, 1.0, 2.0, 0.0]),
        normalize(&[1.0, 1.0, 2.0, 0.0]),
        vec![0.0, 0.0, 0.0, 1.0],
    ];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let v = CosineValue {
        base: 0.3,
        scale: 0.7,
        memories,
        query: q,
    };

    let phi = shapley::exact(
        4,
        &v,
        &ShapleyConfig::default(),
        &AttributionConfig::default(),
        Deadline::none(),
    )
    .unwrap();
    assert!(phi[3].abs() < 0.1, "orthogonal memory got {}", phi[3]);
    assert!(phi[3] <= 0.0, "dilution cannot help the coalition");
}

// ─── ContextCite sparsity ───────────────────────────────────────────────────

#[test]
fn lasso_zeroes_the_irrelevant_memory() {
    // Full mask matrix over three memories; the third contributes nothing.
    let z: Vec<Vec<f64>> = (0u8..8)
        .map(|m| (0..3).map(|j| ((m >> j) & 1) as f64).collect())
        .collect();
    let y: Vec<f64> = z.iter().map(|row| 4.0 * row[0] + 3.0 * row[1]).collect();

    let w = lasso::fit(&z, &y, 2.0, 1e-8, 2000);

    assert!(w[2].abs() < 0.01, "irrelevant weight survived: {}", w[2]);
    assert!(w[0].abs() > 0.01, "w1 vanished: {}", w[0]);
    assert!(w[1].abs() > 0.01, "w2 vanished: {}", w[1]);
}

#[test]
fn contextcite_end_to_end_recovers_relevance_order() {
    let contents = ["paris is the capital", "france is in europe", "the moon is rock"];
    let oracle = LinearOracle::new(
        -8.0,
        [
            (contents[0].to_string(), 3.0),
            (contents[1].to_string(), 1.5),
        ],
    );
    let cfg = ContextCiteConfig::default();
    let attr_cfg = AttributionConfig::default();

    let out = contextcite::run(
        "what is the capital of france",
        "paris",
        &contents,
        &oracle,
        &cfg,
        &attr_cfg,
        42,
        Deadline::none(),
    )
    .unwrap();

    assert_eq!(out.oracle_calls, cfg.num_samples as u32);
    assert!(!out.degraded);
    assert!(out.weights[0] > out.weights[1], "weights: {:?}", out.weights);
    assert!(out.weights[1] > out.weights[2].abs(), "weights: {:?}", out.weights);
    assert!(out.lds > 0.9, "surrogate should be confident, lds = {}", out.lds);
}

#[test]
fn contextcite_same_seed_is_deterministic() {
    let contents = ["a", "b"];
    let oracle = LinearOracle::new(-3.0, [("a".to_string(), 1.0)]);
    let cfg = ContextCiteConfig { num_samples: 16, ..Default::default() };
    let attr_cfg = AttributionConfig::default();

    let run = |seed| {
        contextcite::run("q", "r", &contents, &oracle, &cfg, &attr_cfg, seed, Deadline::none())
            .unwrap()
    };
    let a = run(7);
    let b = run(7);
    assert_eq!(a.weights, b.weights);
    assert_eq!(a.lds, b.lds);
}

#[test]
fn contextcite_recovers_from_transient_oracle_failures() {
    let contents = ["x", "y"];
    let inner = LinearOracle::new(-2.0, [("x".to_string(), 2.0)]);
    let oracle = FlakyOracle::new(inner, 2);
    let cfg = ContextCiteConfig { num_samples: 8, ..Default::default() };
    let attr_cfg = AttributionConfig {
        oracle_backoff_base_ms: 0,
        ..Default::default()
    };

    let out = contextcite::run("q", "r", &contents, &oracle, &cfg, &attr_cfg, 1, Deadline::none())
        .unwrap();
    assert!(!out.degraded, "retries should have absorbed the outage");
    assert!(out.weights[0] > 0.0);
}

#[test]
fn contextcite_flags_zero_confidence_on_oracle_exhaustion() {
    let contents = ["x", "y"];
    let inner = LinearOracle::new(-2.0, [("x".to_string(), 2.0)]);
    // More failures than total retry budget across all masks.
    let oracle = FlakyOracle::new(inner, 10_000);
    let cfg = ContextCiteConfig { num_samples: 8, ..Default::default() };
    let attr_cfg = AttributionConfig {
        oracle_backoff_base_ms: 0,
        ..Default::default()
    };

    let out = contextcite::run("q", "r", &contents, &oracle, &cfg, &attr_cfg, 1, Deadline::none())
        .unwrap();
    assert!(out.degraded);
    assert_eq!(out.lds, 0.0, "exhausted run must report zero confidence");
}

#[test]
fn contextcite_empty_set_fails() {
    let oracle = LinearOracle::new(0.0, []);
    let out = contextcite::run(
        "q",
        "r",
        &[],
        &oracle,
        &ContextCiteConfig::default(),
        &AttributionConfig::default(),
        0,
        Deadline::none(),
    );
    assert!(out.is_err());
}
