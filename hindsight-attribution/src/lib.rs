//! # hindsight-attribution
//!
//! The attribution kernel: three engines of increasing cost and precision.
//!
//! - [`eas`] — closed-form Embedding Attribution Score, the zero-oracle
//!   production default, O(k·d).
//! - [`contextcite`] — ablation masks scored by a [`LogProb`] oracle, fit
//!   with a LASSO surrogate ([`lasso`]), self-confidence reported as the
//!   Linear Datamodeling Score.
//! - [`shapley`] — exact enumeration (k bounded) and Monte-Carlo
//!   permutation sampling over a [`ValueFunction`].
//!
//! Every engine is a pure function of its oracle outputs, so oracle calls
//! are fanned out with rayon without affecting results.
//!
//! [`LogProb`]: hindsight_core::traits::LogProb
//! [`ValueFunction`]: hindsight_core::traits::ValueFunction

pub mod contextcite;
pub mod deadline;
pub mod eas;
pub mod lasso;
pub mod retry;
pub mod shapley;

pub use deadline::Deadline;
