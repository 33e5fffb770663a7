mod embedder;
mod oracle;

pub use embedder::Embedder;
pub use oracle::{LogProb, ValueFunction};
