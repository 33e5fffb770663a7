mod attribution;
mod certificate;
mod interaction;
mod memory;
mod metrics;
mod profile;
mod provenance;

pub use attribution::{AttributionOutcome, AttributionScore, ScoreMethod, ScoreType};
pub use certificate::{ComplianceCertificate, Footprint, InfluenceReport, RequestType};
pub use interaction::{Interaction, InteractionStatus};
pub use memory::{Criticality, Memory, MemoryStatus, MemoryType, Tier, shard_for};
pub use metrics::{
    AgentAggregate, AgentCostConfig, CalibrationPair, Contradiction, DashboardOverview,
    MemoryRoi, RedundantPair,
};
pub use profile::MemoryProfile;
pub use provenance::{
    month_bucket, AttributionEdge, CreationEdge, DerivationEdge, DerivationType, EmbeddingNode,
    InteractionNode, MemoryNode, NodeType, ResponseNode, StatementAttributionEdge, SummaryNode,
};
