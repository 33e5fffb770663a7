//! Shapley axioms and EAS universal invariants, checked over generated
//! inputs.

use proptest::prelude::*;

use hindsight_attribution::{eas, shapley, Deadline};
use hindsight_core::config::{AttributionConfig, ShapleyConfig};
use hindsight_core::traits::ValueFunction;
use hindsight_core::HindsightResult;
use hindsight_vector::normalize;
use test_fixtures::CosineValue;

/// Value function defined by an explicit per-subset table (bitmask indexed).
struct TableValue(Vec<f64>);

impl ValueFunction for TableValue {
    fn value(&self, subset: &[usize]) -> HindsightResult<f64> {
        let mask: usize = subset.iter().map(|&i| 1usize << i).sum();
        Ok(self.0[mask])
    }
}

fn exact(k: usize, v: &dyn ValueFunction) -> Vec<f64> {
    shapley::exact(
        k,
        v,
        &ShapleyConfig::default(),
        &AttributionConfig::default(),
        Deadline::none(),
    )
    .unwrap()
}

// ─── Efficiency ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_exact_efficiency(values in proptest::collection::vec(0.0f64..1.0, 8)) {
        let v = TableValue(values.clone());
        let phi = exact(3, &v);
        let total: f64 = phi.iter().sum();
        let expected = values[0b111] - values[0];
        prop_assert!((total - expected).abs() < 1e-9, "{total} vs {expected}");
    }

    #[test]
    fn prop_sampled_efficiency(values in proptest::collection::vec(0.0f64..1.0, 8), seed in 0u64..1000) {
        let v = TableValue(values.clone());
        let out = shapley::sampled(
            3,
            &v,
            &ShapleyConfig { mc_samples: 40, ..Default::default() },
            &AttributionConfig::default(),
            seed,
            Deadline::none(),
        ).unwrap();
        // Marginals telescope within each permutation, so the sampled sum
        // matches v(full) - v(empty) regardless of sample count.
        let total: f64 = out.phi.iter().sum();
        let expected = values[0b111] - values[0];
        prop_assert!((total - expected).abs() < 1e-3, "{total} vs {expected}");
    }

    #[test]
    fn prop_eas_normalizes(
        seeds in proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, 6), 1..8),
        q_raw in proptest::collection::vec(-1.0f32..1.0, 6),
        r_raw in proptest::collection::vec(-1.0f32..1.0, 6),
    ) {
        let memories: Vec<Vec<f32>> = seeds.iter().map(|s| normalize(s)).collect();
        let q = normalize(&q_raw);
        let r = normalize(&r_raw);
        let a = eas::score(&memories, &q, &r).unwrap();
        let sum: f64 = a.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
        prop_assert!(a.iter().all(|&x| x >= 0.0));
        prop_assert_eq!(a.len(), memories.len());
    }
}

// ─── Symmetry ───────────────────────────────────────────────────────────────

#[test]
fn identical_memories_receive_equal_shares() {
    let shared = normalize(&[0.7, 0.7, 0.1, 0.0]);
    let memories = vec![shared.clone(), shared, normalize(&[0.0, 0.1, 1.0, 0.0])];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let v = CosineValue {
        base: 0.3,
        scale: 0.7,
        memories,
        query: q,
    };
    let phi = exact(3, &v);
    assert!(
        (phi[0] - phi[1]).abs() < 1e-3,
        "symmetric memories diverged: {} vs {}",
        phi[0],
        phi[1]
    );
}

// ─── Null player ────────────────────────────────────────────────────────────

#[test]
fn table_null_player_gets_zero() {
    // Memory 2 never changes the value of any coalition.
    let mut table = vec![0.0; 8];
    for mask in 0..8usize {
        let without_two = mask & 0b011;
        table[mask] = match without_two {
            0b000 => 0.2,
            0b001 => 0.6,
            0b010 => 0.5,
            0b011 => 0.9,
            _ => unreachable!(),
        };
    }
    let phi = exact(3, &TableValue(table));
    assert!(phi[2].abs() < 1e-12, "null player got {}", phi[2]);
}

// ─── EAS null-player analogue ───────────────────────────────────────────────

#[test]
fn eas_orthogonal_memory_scores_zero() {
    // Orthogonal to both q and r: the cosine clamp zeroes it outright.
    let memories = vec![
        normalize(&[1.0, 0.0, 0.0, 0.0]),
        normalize(&[0.8, 0.6, 0.0, 0.0]),
        vec![0.0, 0.0, 0.0, 1.0],
    ];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let r = normalize(&[0.5, 0.9, 0.0, 0.0]);
    let a = eas::score(&memories, &q, &r).unwrap();
    assert_eq!(a[2], 0.0);
    let sum: f64 = a.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

// ─── Approximate tracks exact ───────────────────────────────────────────────

#[test]
fn sampled_approximates_exact_on_small_game() {
    let memories = vec![
        normalize(&[1.0, 0.1, 0.0, 0.0]),
        normalize(&[0.2, 1.0, 0.0, 0.0]),
        normalize(&[0.1, 0.2, 1.0, 0.0]),
    ];
    let q = normalize(&[0.6, 0.8, 0.0, 0.0]);
    let v = CosineValue {
        base: 0.3,
        scale: 0.7,
        memories,
        query: q,
    };
    let ex = exact(3, &v);
    let approx = shapley::sampled(
        3,
        &v,
        &ShapleyConfig { mc_samples: 2000, ..Default::default() },
        &AttributionConfig::default(),
        99,
        Deadline::none(),
    )
    .unwrap();
    for (e, a) in ex.iter().zip(&approx.phi) {
        assert!((e - a).abs() < 0.05, "exact {e} vs sampled {a}");
    }
    assert!(approx.confidence.iter().all(|&c| c > 0.5));
}
