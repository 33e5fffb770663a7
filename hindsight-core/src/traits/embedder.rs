//! The embedding model as the core consumes it.

use crate::errors::HindsightResult;

/// Produces unit-norm vectors of a fixed dimension.
///
/// The core never implements this; production wires in an external model,
/// tests use a deterministic fake.
pub trait Embedder: Send + Sync {
    /// Fixed output dimension for every vector this embedder produces.
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> HindsightResult<Vec<f32>>;

    /// Batch form. Default loops; implementations with real batch endpoints
    /// should override.
    fn embed_batch(&self, texts: &[&str]) -> HindsightResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
