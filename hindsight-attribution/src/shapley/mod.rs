//! Shapley attribution over a coalition value function.
//!
//! [`exact`] enumerates all 2^k subsets and is bounded by
//! `ShapleyConfig::max_exact_k`; [`sampled`] is TMC-Shapley, Monte-Carlo
//! permutation sampling with per-memory confidence. Sampled results are
//! always labeled approximate.

mod exact;
mod sampled;

pub use exact::exact;
pub use sampled::{sampled, SampledShapley};
