//! Compliance footprint, influence, and deletion certificates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a compliance request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    GdprDeletion,
    AuditRequest,
    DataExport,
}

/// F(u): every node reachable from a user's interactions via creation and
/// derivation edges. Id vectors are kept sorted so the canonical
/// serialization (and therefore the certificate hash) is reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub interactions: Vec<Uuid>,
    pub memories: Vec<Uuid>,
    pub summaries: Vec<Uuid>,
    pub embeddings: Vec<Uuid>,
}

impl Footprint {
    /// Sort each class lexicographically by hyphenated form.
    pub fn normalize(&mut self) {
        self.interactions.sort();
        self.memories.sort();
        self.summaries.sort();
        self.embeddings.sort();
    }

    /// Canonical byte serialization hashed into the certificate.
    /// Classes appear in a fixed order; ids in sorted hyphenated form.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for (label, ids) in [
            ("interactions", &self.interactions),
            ("memories", &self.memories),
            ("summaries", &self.summaries),
            ("embeddings", &self.embeddings),
        ] {
            out.push_str(label);
            out.push(':');
            for id in ids {
                out.push_str(&id.hyphenated().to_string());
                out.push(',');
            }
            out.push('|');
        }
        out.into_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
            && self.memories.is_empty()
            && self.summaries.is_empty()
            && self.embeddings.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.interactions.len() + self.memories.len() + self.summaries.len() + self.embeddings.len()
    }
}

/// I(u): distinct interactions influenced by a user's footprint memories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfluenceReport {
    pub user_id: String,
    pub interactions: Vec<Uuid>,
}

/// Immutable record of a compliance request. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCertificate {
    pub id: Uuid,
    pub user_id: String,
    pub request_type: RequestType,
    pub footprint: Footprint,
    /// SHA-256 hex of `footprint.canonical_bytes()`.
    pub snapshot_hash: String,
    pub grace_period_end: DateTime<Utc>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}
