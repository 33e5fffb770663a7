//! # hindsight-provenance
//!
//! The append-only provenance DAG over attribution records: five node
//! kinds, four edge kinds, recursive footprint/influence queries, and
//! compliance deletion with reproducible certificates.
//!
//! The DAG is acyclic by construction: derivation and attribution edges
//! never point backwards in time. Nodes are immutable after creation except
//! `MemoryNode.status`, which only advances.

mod compliance;
mod footprint;
mod recorder;

pub use compliance::ComplianceReport;
pub use footprint::certificate_hash;
pub use recorder::{
    record_contextcite_tx, record_memory_creation_tx, record_transaction_tx, ProvenanceService,
};
