/// Errors from provenance DAG writes and compliance queries.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("node not found: {node_type} {id}")]
    NodeNotFound { node_type: String, id: String },

    #[error("derivation edge would point backwards in time: {source_node} -> {target}")]
    BackwardsDerivation { source_node: String, target: String },

    #[error("no current attribution edge for ({source_node}, {target})")]
    NoCurrentEdge { source_node: String, target: String },

    #[error("deletion verification failed for user {user_id}: {reason}")]
    VerificationFailed { user_id: String, reason: String },
}
