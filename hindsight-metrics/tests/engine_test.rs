//! MetricsEngine over a seeded store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use hindsight_core::models::{
    month_bucket, AgentCostConfig, AttributionEdge, AttributionScore, Interaction,
    InteractionStatus, ScoreType,
};
use hindsight_metrics::{portfolio, MetricsEngine};
use hindsight_storage::queries::{aggregation, attribution_ops, edge_ops, interaction_ops, profile_ops};
use hindsight_storage::StorageEngine;
use test_fixtures::{make_memory, make_memory_with_embedding};

fn engine() -> (Arc<StorageEngine>, MetricsEngine) {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let metrics = MetricsEngine::new(Arc::clone(&storage));
    (storage, metrics)
}

fn seed_interaction(storage: &StorageEngine, agent: &str, scores: &[(Uuid, f64)]) -> Uuid {
    let now = Utc::now();
    let interaction = Interaction {
        id: Uuid::now_v7(),
        agent_id: agent.to_string(),
        user_id: "user".into(),
        query_text: "q".into(),
        query_embedding: vec![1.0, 0.0],
        response_text: Some("r".into()),
        response_embedding: Some(vec![0.0, 1.0]),
        response_token_count: Some(4),
        model: None,
        memory_ids: scores.iter().map(|&(id, _)| id).collect(),
        status: InteractionStatus::Completed,
        cost: 1.0,
        created_at: now,
        completed_at: Some(now),
    };

    storage
        .with_txn(|conn| {
            interaction_ops::insert_interaction(conn, &interaction)?;
            let rows: Vec<AttributionScore> = scores
                .iter()
                .enumerate()
                .map(|(rank, &(memory_id, score))| AttributionScore {
                    memory_id,
                    interaction_id: interaction.id,
                    score,
                    score_type: ScoreType::Eas,
                    confidence: 1.0,
                    rank,
                })
                .collect();
            attribution_ops::insert_scores(conn, &rows, now)?;
            for row in &rows {
                profile_ops::upsert_profile(conn, row.memory_id, row.score, now)?;
                edge_ops::insert_attribution_edge(
                    conn,
                    &AttributionEdge {
                        id: Uuid::now_v7(),
                        source_memory_id: row.memory_id,
                        target_interaction_id: interaction.id,
                        score: row.score,
                        score_type: row.score_type,
                        version: 1,
                        is_current: true,
                        month_bucket: month_bucket(now),
                        created_at: now,
                    },
                )?;
            }
            Ok(())
        })
        .unwrap();
    interaction.id
}

#[test]
fn overview_aggregates_and_persists_health_snapshot() {
    let (storage, metrics) = engine();

    let m1 = make_memory("u", "useful memory content here", 8);
    let m2 = make_memory("u", "dead weight", 8);
    storage.create_memory(&m1).unwrap();
    storage.create_memory(&m2).unwrap();

    seed_interaction(&storage, "agent-1", &[(m1.id, 0.95), (m2.id, 0.001)]);
    seed_interaction(&storage, "agent-2", &[(m1.id, 0.6)]);

    let overview = metrics.overview().unwrap();
    assert_eq!(overview.agents.len(), 2);
    assert!(overview.gini > 0.0 && overview.gini <= 1.0);
    assert!(overview.snr_db.is_finite());
    assert!(overview.waste_rate > 0.0, "m2's tokens are wasted");

    let snapshots = storage
        .read(|conn| aggregation::health_snapshot_count(conn))
        .unwrap();
    assert_eq!(snapshots, 1);
}

#[test]
fn roi_ranking_sorts_descending() {
    let (storage, metrics) = engine();

    let cheap_useful = make_memory("u", "short", 8);
    let costly_useless = make_memory(
        "u",
        "a very long memory with many many tokens that costs a lot to retrieve every day",
        8,
    );
    storage.create_memory(&cheap_useful).unwrap();
    storage.create_memory(&costly_useless).unwrap();

    seed_interaction(
        &storage,
        "agent-1",
        &[(cheap_useful.id, 0.9), (costly_useless.id, 0.01)],
    );

    let ranking = metrics.roi_ranking().unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].memory_id, cheap_useful.id);
    assert!(ranking[0].roi > ranking[1].roi);
}

#[test]
fn redundancy_report_finds_near_duplicates() {
    let (storage, metrics) = engine();

    let shared = hindsight_vector::normalize(&[0.9, 0.1, 0.0, 0.0]);
    let a = make_memory_with_embedding("u", "same fact phrased once", shared.clone());
    let b = make_memory_with_embedding("u", "same fact phrased twice", shared);
    let c = make_memory_with_embedding(
        "u",
        "unrelated",
        hindsight_vector::normalize(&[0.0, 0.0, 1.0, 0.0]),
    );
    for m in [&a, &b, &c] {
        storage.create_memory(m).unwrap();
    }

    let (pairs, tax) = metrics.redundancy_report().unwrap();
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].similarity > 0.92);
    assert!(tax > 0.0);
}

#[test]
fn contradiction_risk_compounds_recorded_pairs() {
    let (_storage, metrics) = engine();
    let a = Uuid::now_v7();
    let b = Uuid::now_v7();
    let c = Uuid::now_v7();

    assert_eq!(metrics.contradiction_risk().unwrap(), 0.0);

    metrics.record_contradiction(a, b, 0.5, "semantic").unwrap();
    metrics.record_contradiction(b, c, 0.5, "temporal").unwrap();
    let risk = metrics.contradiction_risk().unwrap();
    assert!((risk - 0.75).abs() < 1e-12);
}

#[test]
fn staleness_counts_old_but_hot_memories() {
    let (storage, metrics) = engine();

    let mut old_hot = make_memory("u", "old but hot", 8);
    old_hot.created_at = Utc::now() - Duration::days(200);
    let mut fresh_hot = make_memory("u", "fresh and hot", 8);
    fresh_hot.created_at = Utc::now() - Duration::days(5);
    let mut old_cold = make_memory("u", "old and cold", 8);
    old_cold.created_at = Utc::now() - Duration::days(200);
    old_cold.last_accessed = Utc::now() - Duration::days(120);

    for m in [&old_hot, &fresh_hot, &old_cold] {
        storage.create_memory(m).unwrap();
    }

    // Frequent set = {old_hot, fresh_hot}; stale among them = {old_hot}.
    let idx = metrics.staleness_index().unwrap();
    assert!((idx - 50.0).abs() < 1e-9, "got {idx}");
}

#[test]
fn agent_cost_config_falls_back_to_pricing_defaults() {
    let (_storage, metrics) = engine();

    let fallback = metrics.agent_cost_config("unknown-agent").unwrap();
    assert!((fallback.queries_per_day - 1000.0).abs() < f64::EPSILON);

    metrics
        .set_agent_cost_config(&AgentCostConfig {
            agent_id: "tuned-agent".into(),
            input_token_cost: 1e-6,
            output_token_cost: 2e-6,
            queries_per_day: 50.0,
        })
        .unwrap();
    let stored = metrics.agent_cost_config("tuned-agent").unwrap();
    assert!((stored.queries_per_day - 50.0).abs() < f64::EPSILON);
}

// ─── Universal invariants over the pure functions ───────────────────────────

proptest! {
    #[test]
    fn prop_gini_bounded_for_nonnegative_input(
        xs in proptest::collection::vec(0.0f64..10.0, 0..40)
    ) {
        let g = portfolio::gini(&xs);
        prop_assert!((0.0..=1.0).contains(&g), "gini out of bounds: {g}");
    }

    #[test]
    fn prop_snr_always_finite(
        xs in proptest::collection::vec(-10.0f64..10.0, 0..40)
    ) {
        prop_assert!(portfolio::snr_db(&xs).is_finite());
    }

    #[test]
    fn prop_contradiction_risk_bounded(
        ps in proptest::collection::vec(0.0f64..=1.0, 0..20)
    ) {
        let risk = portfolio::contradiction_risk(&ps);
        prop_assert!((0.0..=1.0).contains(&risk));
    }
}
