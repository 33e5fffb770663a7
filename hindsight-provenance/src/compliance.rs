//! Compliance deletion: certificate issuance, cascade to pending-deletion,
//! and the post-cascade verification pass.

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use hindsight_core::models::{ComplianceCertificate, MemoryStatus, RequestType};
use hindsight_core::HindsightResult;
use hindsight_storage::queries::{compliance_ops, edge_ops, memory_ops, node_ops};

use crate::recorder::ProvenanceService;

/// What the verification pass found.
#[derive(Debug, Clone)]
pub struct ComplianceReport {
    pub certificate_id: Uuid,
    pub verified: bool,
    pub orphan_edges: usize,
    pub live_attribution_edges: usize,
    pub proximity_suspects: usize,
}

impl ProvenanceService {
    /// `compliance.delete`: snapshot F(u) into a certificate, advance every
    /// footprint memory to pending-deletion (30-day grace), zero its current
    /// attribution edges, then verify the cascade. The certificate is marked
    /// verified only when every check passes.
    pub fn compliance_delete(
        &self,
        user_id: &str,
        request_type: RequestType,
    ) -> HindsightResult<ComplianceReport> {
        let (footprint, snapshot_hash) = self.footprint(user_id)?;
        let now = Utc::now();
        let grace_period_end = now + Duration::days(self.compliance.grace_period_days);

        let certificate = ComplianceCertificate {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            request_type,
            footprint: footprint.clone(),
            snapshot_hash,
            grace_period_end,
            verified: false,
            created_at: now,
        };

        // Certificate + cascade in one transaction: every footprint memory
        // advances to pending_deletion and its live attribution edges are
        // zeroed (append-only, via flip+insert).
        self.storage().with_txn(|conn| {
            compliance_ops::insert_certificate(conn, &certificate)?;
            for &memory_id in &footprint.memories {
                if let Some(memory) = memory_ops::get_memory(conn, memory_id)? {
                    if memory.status.can_advance_to(MemoryStatus::PendingDeletion) {
                        memory_ops::advance_status(
                            conn,
                            memory_id,
                            MemoryStatus::PendingDeletion,
                            now,
                        )?;
                    }
                }
                if let Some(node) = node_ops::get_memory_node(conn, memory_id)? {
                    if node.status.can_advance_to(MemoryStatus::PendingDeletion) {
                        node_ops::advance_memory_node_status(
                            conn,
                            memory_id,
                            MemoryStatus::PendingDeletion,
                        )?;
                    }
                }
            }
            let live = edge_ops::current_edges_from_memories(conn, &footprint.memories, 0.0)?;
            for edge in live {
                edge_ops::flip_and_insert(
                    conn,
                    edge.source_memory_id,
                    edge.target_interaction_id,
                    0.0,
                    edge.score_type,
                    now,
                )?;
            }
            Ok(())
        })?;

        let report = self.verify_deletion(&certificate)?;
        if report.verified {
            self.storage()
                .with_txn(|conn| compliance_ops::set_verified(conn, certificate.id, true))?;
            info!(user = user_id, certificate = %certificate.id, "compliance deletion verified");
        } else {
            warn!(
                user = user_id,
                certificate = %certificate.id,
                orphan_edges = report.orphan_edges,
                live_attribution_edges = report.live_attribution_edges,
                proximity_suspects = report.proximity_suspects,
                "compliance deletion verification FAILED; certificate left unverified"
            );
        }
        Ok(report)
    }

    /// The three-check verification pass: orphan derivation edges,
    /// still-positive attribution edges, and embedding-proximity residuals.
    pub fn verify_deletion(
        &self,
        certificate: &ComplianceCertificate,
    ) -> HindsightResult<ComplianceReport> {
        let memories = &certificate.footprint.memories;

        let (orphan_edges, live_attribution_edges, proximity_suspects) =
            self.storage().read(|conn| {
                let orphans = edge_ops::orphan_derivation_edges(conn, memories)?;

                let live = edge_ops::current_edges_from_memories(conn, memories, 0.0)?.len();

                // Residual check: an active memory outside the footprint whose
                // embedding sits above the proximity threshold against a
                // deleted one suggests an undeclared copy.
                let mut deleted_embeddings = Vec::new();
                for &id in memories {
                    if let Some(memory) = memory_ops::get_memory(conn, id)? {
                        if !memory.embedding.is_empty() {
                            deleted_embeddings.push(memory.embedding);
                        }
                    }
                }
                let mut suspects = 0usize;
                for survivor in memory_ops::get_active_memories(conn)? {
                    if memories.contains(&survivor.id) {
                        continue;
                    }
                    for deleted in &deleted_embeddings {
                        if survivor.embedding.len() == deleted.len()
                            && hindsight_vector::cosine(&survivor.embedding, deleted)?
                                > self.compliance.proximity_threshold
                        {
                            suspects += 1;
                            break;
                        }
                    }
                }
                Ok((orphans, live, suspects))
            })?;

        Ok(ComplianceReport {
            certificate_id: certificate.id,
            verified: orphan_edges == 0 && live_attribution_edges == 0 && proximity_suspects == 0,
            orphan_edges,
            live_attribution_edges,
            proximity_suspects,
        })
    }

    /// `compliance.footprint`: F(u) summary plus certificate hash, recorded
    /// as an audit-request certificate.
    pub fn footprint_certificate(
        &self,
        user_id: &str,
    ) -> HindsightResult<ComplianceCertificate> {
        let (footprint, snapshot_hash) = self.footprint(user_id)?;
        let now = Utc::now();
        let certificate = ComplianceCertificate {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            request_type: RequestType::AuditRequest,
            footprint,
            snapshot_hash,
            grace_period_end: now,
            verified: true,
            created_at: now,
        };
        self.storage()
            .with_txn(|conn| compliance_ops::insert_certificate(conn, &certificate))?;
        Ok(certificate)
    }
}
