//! Oracles the attribution kernel calls out to.
//!
//! These are the only I/O-bound operations in the kernel; callers may fan
//! them out across masks or permutations freely because the kernel is a pure
//! function of their outputs.

use crate::errors::HindsightResult;

/// Scores a response's log-probability under a masked context.
pub trait LogProb: Send + Sync {
    /// Log-probability of `response` given `query` and the included subset
    /// of memory contents, in snapshot order.
    fn log_prob(&self, query: &str, response: &str, context: &[&str]) -> HindsightResult<f64>;
}

/// Coalition value function for Shapley attribution.
pub trait ValueFunction: Send + Sync {
    /// Quality of the response when only `subset` (ascending indices into
    /// the snapshot order) is available.
    fn value(&self, subset: &[usize]) -> HindsightResult<f64>;
}
