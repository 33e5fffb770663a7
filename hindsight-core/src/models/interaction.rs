//! Interaction (transaction) entity for the two-phase protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol state of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Pending,
    Completed,
    Failed,
}

/// One query/response exchange with its snapshotted retrieved set.
///
/// `memory_ids` is the ordered snapshot taken at initiate (or single-shot)
/// time and is immutable afterwards. Response fields stay `None` while the
/// interaction is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub agent_id: String,
    pub user_id: String,
    pub query_text: String,
    pub query_embedding: Vec<f32>,
    pub response_text: Option<String>,
    pub response_embedding: Option<Vec<f32>>,
    pub response_token_count: Option<u32>,
    pub model: Option<String>,
    /// Ordered snapshot of the retrieved set. Attribution rank i refers to
    /// `memory_ids[i]`.
    pub memory_ids: Vec<Uuid>,
    pub status: InteractionStatus,
    /// Accumulated oracle/token cost of scoring this interaction.
    pub cost: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
