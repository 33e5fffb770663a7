//! Compliance deletion: certificate issuance, cascade, verification pass.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use hindsight_core::models::{
    AttributionScore, Interaction, InteractionStatus, MemoryStatus, RequestType, ScoreType,
};
use hindsight_provenance::{certificate_hash, ProvenanceService};
use hindsight_storage::queries::compliance_ops;
use hindsight_storage::StorageEngine;
use test_fixtures::make_memory;

fn service() -> ProvenanceService {
    ProvenanceService::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
}

fn make_interaction(user_id: &str, memory_ids: Vec<Uuid>) -> Interaction {
    let now = Utc::now();
    Interaction {
        id: Uuid::now_v7(),
        agent_id: "agent-1".into(),
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

fn seed_user(svc: &ProvenanceService, user: &str) -> Vec<Uuid> {
    let m1 = make_memory(user, "private fact one", 8);
    let m2 = make_memory(user, "private fact two", 8);
    svc.storage().create_memory(&m1).unwrap();
    svc.storage().create_memory(&m2).unwrap();

    let creator = make_interaction(user, vec![]);
    svc.record_transaction(&creator, &[]).unwrap();
    svc.record_memory_creation(&m1, creator.id, "vec://m1").unwrap();
    svc.record_memory_creation(&m2, creator.id, "vec://m2").unwrap();

    // A downstream interaction influenced by the user's memories.
    let reader = make_interaction("other-user", vec![m1.id]);
    svc.record_transaction(
        &reader,
        &[AttributionScore {
            memory_id: m1.id,
            interaction_id: reader.id,
            score: 0.7,
            score_type: ScoreType::Eas,
            confidence: 1.0,
            rank: 0,
        }],
    )
    .unwrap();

    vec![m1.id, m2.id]
}

#[test]
fn compliance_delete_cascades_and_verifies() {
    let svc = service();
    let memories = seed_user(&svc, "user-u");

    let report = svc
        .compliance_delete("user-u", RequestType::GdprDeletion)
        .unwrap();
    assert!(report.verified, "cascade should verify: {report:?}");
    assert_eq!(report.orphan_edges, 0);
    assert_eq!(report.live_attribution_edges, 0);

    // Memories advanced to pending deletion with the grace stamp.
    for id in &memories {
        let memory = svc.storage().get_memory(*id).unwrap().unwrap();
        assert_eq!(memory.status, MemoryStatus::PendingDeletion);
        assert!(memory.deleted_at.is_some());
    }

    // Certificate persisted, verified, hash matches the footprint snapshot.
    let cert = svc
        .storage()
        .read(|conn| compliance_ops::get_certificate(conn, report.certificate_id))
        .unwrap()
        .unwrap();
    assert!(cert.verified);
    assert_eq!(cert.request_type, RequestType::GdprDeletion);
    assert_eq!(cert.snapshot_hash, certificate_hash(&cert.footprint));
    assert!(cert.grace_period_end > cert.created_at);

    // Influence is gone after the cascade zeroed the edges.
    let influence = svc.influence("user-u").unwrap();
    assert!(influence.interactions.is_empty());
}

#[test]
fn footprint_certificate_records_audit_request() {
    let svc = service();
    seed_user(&svc, "user-u");

    let cert = svc.footprint_certificate("user-u").unwrap();
    assert_eq!(cert.request_type, RequestType::AuditRequest);
    assert_eq!(cert.snapshot_hash.len(), 64);

    let stored = svc
        .storage()
        .read(|conn| compliance_ops::certificates_for_user(conn, "user-u"))
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].snapshot_hash, cert.snapshot_hash);
}

#[test]
fn deleting_an_empty_user_produces_empty_verified_footprint() {
    let svc = service();
    let report = svc
        .compliance_delete("ghost-user", RequestType::GdprDeletion)
        .unwrap();
    assert!(report.verified);

    let cert = svc
        .storage()
        .read(|conn| compliance_ops::get_certificate(conn, report.certificate_id))
        .unwrap()
        .unwrap();
    assert!(cert.footprint.is_empty());
}
