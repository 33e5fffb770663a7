//! Provenance DAG: footprint closure, influence tracing, certificate
//! reproducibility, attribution versioning.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use hindsight_core::models::{
    AttributionScore, Interaction, InteractionStatus, Memory, NodeType, ScoreType, SummaryNode,
};
use hindsight_provenance::ProvenanceService;
use hindsight_storage::queries::edge_ops;
use hindsight_storage::StorageEngine;
use test_fixtures::make_memory;

fn service() -> ProvenanceService {
    ProvenanceService::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
}

fn make_interaction(user_id: &str, agent_id: &str, memory_ids: Vec<Uuid>) -> Interaction {
    let now = Utc::now();
    Interaction {
        id: Uuid::now_v7(),
        agent_id: agent_id.to_string(),
        user_id: user_id.to_string(),
        query_text: "q".into(),
        query_embedding: vec![1.0, 0.0],
        response_text: Some("r".into()),
        response_embedding: Some(vec![0.0, 1.0]),
        response_token_count: Some(1),
        model: Some("test-model".into()),
        memory_ids,
        status: InteractionStatus::Completed,
        cost: 0.0,
        created_at: now,
        completed_at: Some(now),
    }
}

fn score(memory_id: Uuid, interaction_id: Uuid, value: f64, rank: usize) -> AttributionScore {
    AttributionScore {
        memory_id,
        interaction_id,
        score: value,
        score_type: ScoreType::Eas,
        confidence: 1.0,
        rank,
    }
}

/// Build the consolidation scenario: user u's interactions i1, i2 create
/// m1, m2 (with embeddings e_m1, e_m2); both consolidate into summary s,
/// which is re-embedded to e.
fn build_consolidation_dag(
    svc: &ProvenanceService,
    user: &str,
) -> (Vec<Uuid>, Vec<Uuid>, Uuid, Vec<Uuid>, Memory, Memory) {
    let m1 = make_memory(user, "first fact", 8);
    let m2 = make_memory(user, "second fact", 8);
    svc.storage().create_memory(&m1).unwrap();
    svc.storage().create_memory(&m2).unwrap();

    let i1 = make_interaction(user, "agent-1", vec![]);
    let i2 = make_interaction(user, "agent-1", vec![]);
    svc.record_transaction(&i1, &[]).unwrap();
    svc.record_transaction(&i2, &[]).unwrap();

    let e_m1 = svc.record_memory_creation(&m1, i1.id, "vec://m1").unwrap();
    let e_m2 = svc.record_memory_creation(&m2, i2.id, "vec://m2").unwrap();

    let summary = SummaryNode {
        id: Uuid::now_v7(),
        content_hash: "summary-hash".into(),
        token_count: 12,
        created_at: Utc::now(),
    };
    svc.record_consolidation(&summary, &[m1.id, m2.id]).unwrap();

    let e = svc
        .record_reembedding(summary.id, NodeType::Summary, "vec://s", 8, Utc::now())
        .unwrap();

    (
        vec![i1.id, i2.id],
        vec![m1.id, m2.id],
        summary.id,
        vec![e_m1, e_m2, e],
        m1,
        m2,
    )
}

#[test]
fn footprint_contains_full_consolidation_closure() {
    let svc = service();
    let (interactions, memories, summary, embeddings, _, _) =
        build_consolidation_dag(&svc, "user-u");

    let (footprint, hash) = svc.footprint("user-u").unwrap();

    for id in &interactions {
        assert!(footprint.interactions.contains(id), "missing interaction {id}");
    }
    for id in &memories {
        assert!(footprint.memories.contains(id), "missing memory {id}");
    }
    assert!(footprint.summaries.contains(&summary), "missing summary");
    for id in &embeddings {
        assert!(footprint.embeddings.contains(id), "missing embedding {id}");
    }
    assert_eq!(footprint.node_count(), 8);
    assert_eq!(hash.len(), 64, "sha-256 hex");
}

#[test]
fn footprint_hash_is_reproducible_across_runs() {
    let svc = service();
    build_consolidation_dag(&svc, "user-u");

    let (_, first) = svc.footprint("user-u").unwrap();
    let (_, second) = svc.footprint("user-u").unwrap();
    assert_eq!(first, second);
}

#[test]
fn footprint_is_closed_under_derivation_edges() {
    let svc = service();
    build_consolidation_dag(&svc, "user-u");
    // A second user's DAG must stay outside F(u).
    build_consolidation_dag(&svc, "user-v");

    let (footprint, _) = svc.footprint("user-u").unwrap();
    let mut members: Vec<Uuid> = Vec::new();
    members.extend(&footprint.interactions);
    members.extend(&footprint.memories);
    members.extend(&footprint.summaries);
    members.extend(&footprint.embeddings);

    let edges = svc
        .storage()
        .read(|conn| edge_ops::all_derivation_edges(conn))
        .unwrap();
    for edge in edges {
        if members.contains(&edge.source_id) {
            assert!(
                members.contains(&edge.target_id),
                "derivation edge escapes F(u): {} -> {}",
                edge.source_id,
                edge.target_id
            );
        }
    }

    // And the closures are disjoint.
    let (other, _) = svc.footprint("user-v").unwrap();
    for id in &other.memories {
        assert!(!footprint.memories.contains(id));
    }
}

#[test]
fn influence_traces_current_positive_edges_only() {
    let svc = service();
    let (_, memories, _, _, m1, m2) = build_consolidation_dag(&svc, "user-u");

    // Another user's interaction retrieves u's memories.
    let reader = make_interaction("user-w", "agent-2", memories.clone());
    svc.record_transaction(
        &reader,
        &[score(m1.id, reader.id, 0.8, 0), score(m2.id, reader.id, 0.0, 1)],
    )
    .unwrap();

    let influence = svc.influence("user-u").unwrap();
    assert_eq!(influence.interactions, vec![reader.id]);

    // Zeroing the positive edge removes the influence.
    svc.update_attribution(m1.id, reader.id, 0.0, ScoreType::Calibrated)
        .unwrap();
    let influence = svc.influence("user-u").unwrap();
    assert!(influence.interactions.is_empty());
}

#[test]
fn record_contextcite_writes_response_and_statement_edges() {
    let svc = service();
    let (_, memories, _, _, m1, m2) = build_consolidation_dag(&svc, "user-u");

    let reader = make_interaction("user-w", "agent-2", memories);
    svc.record_transaction(&reader, &[]).unwrap();

    let response = hindsight_core::models::ResponseNode {
        id: Uuid::now_v7(),
        interaction_id: reader.id,
        model: "test-model".into(),
        created_at: Utc::now(),
    };
    svc.record_contextcite(&response, &[(m1.id, 0, 0.8), (m1.id, 1, 0.1), (m2.id, 0, 0.2)])
        .unwrap();

    svc.storage()
        .read(|conn| {
            let statements: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM statement_attribution_edges WHERE response_id = ?1",
                    [response.id.to_string()],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(statements, 3);
            Ok(())
        })
        .unwrap();
}

#[test]
fn update_attribution_versions_monotonically() {
    let svc = service();
    let (_, _, _, _, m1, _) = build_consolidation_dag(&svc, "user-u");

    let reader = make_interaction("user-w", "agent-2", vec![m1.id]);
    svc.record_transaction(&reader, &[score(m1.id, reader.id, 0.5, 0)])
        .unwrap();

    let v2 = svc
        .update_attribution(m1.id, reader.id, 0.61, ScoreType::Calibrated)
        .unwrap();
    let v3 = svc
        .update_attribution(m1.id, reader.id, 0.64, ScoreType::Calibrated)
        .unwrap();
    assert_eq!((v2, v3), (2, 3));

    let history = svc
        .storage()
        .read(|conn| edge_ops::edge_history(conn, m1.id, reader.id))
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.iter().filter(|e| e.is_current).count(), 1);
    let current = history.iter().find(|e| e.is_current).unwrap();
    assert_eq!(current.version, 3);
    assert_eq!(current.score_type, ScoreType::Calibrated);
}
