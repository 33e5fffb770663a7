//! F(u) and I(u) — the reachable-from and reachable-to sets of a user's
//! interactions.
//!
//! F(u) is a fixed-point closure: seed with the user's interaction nodes,
//! expand once along creation edges, then repeatedly along derivation edges
//! until no new node is discovered. The loaded edge set is traversed as a
//! petgraph graph; the result is sorted per class so the SHA-256 of the
//! canonical serialization is reproducible across runs.

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use hindsight_core::models::{Footprint, InfluenceReport, NodeType};
use hindsight_core::HindsightResult;
use hindsight_storage::queries::{edge_ops, node_ops};

use crate::recorder::ProvenanceService;

impl ProvenanceService {
    /// Compute F(u) and the SHA-256 hex of its canonical serialization.
    pub fn footprint(&self, user_id: &str) -> HindsightResult<(Footprint, String)> {
        let (footprint, hash) = self.storage().read(|conn| {
            let seeds = node_ops::interaction_nodes_for_user(conn, user_id)?;
            let creations = edge_ops::creation_edges_from(conn, &seeds)?;
            let derivations = edge_ops::all_derivation_edges(conn)?;

            // Node classes learned from edge endpoint tags.
            let mut classes: HashMap<Uuid, NodeType> = HashMap::new();
            for &seed in &seeds {
                classes.insert(seed, NodeType::Interaction);
            }

            let mut graph: DiGraphMap<Uuid, ()> = DiGraphMap::new();
            for edge in &creations {
                classes.insert(edge.memory_id, NodeType::Memory);
                graph.add_edge(edge.interaction_id, edge.memory_id, ());
            }
            for edge in &derivations {
                classes.entry(edge.source_id).or_insert(edge.source_type);
                classes.entry(edge.target_id).or_insert(edge.target_type);
                graph.add_edge(edge.source_id, edge.target_id, ());
            }

            let mut footprint = Footprint::default();
            let mut visit = |id: Uuid| match classes.get(&id) {
                Some(NodeType::Interaction) => footprint.interactions.push(id),
                Some(NodeType::Memory) => footprint.memories.push(id),
                Some(NodeType::Summary) => footprint.summaries.push(id),
                Some(NodeType::Embedding) => footprint.embeddings.push(id),
                Some(NodeType::Response) | None => {}
            };

            for &seed in &seeds {
                if !graph.contains_node(seed) {
                    // Interaction with no created memories still belongs to F(u).
                    visit(seed);
                    continue;
                }
                let mut bfs = Bfs::new(&graph, seed);
                while let Some(node) = bfs.next(&graph) {
                    visit(node);
                }
            }

            footprint.normalize();
            footprint.interactions.dedup();
            footprint.memories.dedup();
            footprint.summaries.dedup();
            footprint.embeddings.dedup();

            let hash = certificate_hash(&footprint);
            Ok((footprint, hash))
        })?;
        Ok((footprint, hash))
    }

    /// I(u): distinct interactions reached from F(u) memories via current
    /// attribution edges with score > 0.
    pub fn influence(&self, user_id: &str) -> HindsightResult<InfluenceReport> {
        let (footprint, _) = self.footprint(user_id)?;
        let edges = self.storage().read(|conn| {
            edge_ops::current_edges_from_memories(conn, &footprint.memories, 0.0)
        })?;

        let mut interactions: Vec<Uuid> =
            edges.iter().map(|e| e.target_interaction_id).collect();
        interactions.sort();
        interactions.dedup();

        Ok(InfluenceReport {
            user_id: user_id.to_string(),
            interactions,
        })
    }
}

/// SHA-256 hex over the footprint's canonical byte serialization.
pub fn certificate_hash(footprint: &Footprint) -> String {
    let digest = Sha256::digest(footprint.canonical_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
