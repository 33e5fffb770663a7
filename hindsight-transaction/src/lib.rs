//! # hindsight-transaction
//!
//! The attribution transaction protocol. Two paths into the same scoring
//! core:
//!
//! - **single-shot** — query, response, and retrieved set all known up
//!   front; embed, score, persist in one storage transaction.
//! - **two-phase** — `initiate` snapshots the retrieved set at query time;
//!   `complete` scores once the response exists. The snapshot is re-fetched
//!   ignoring soft-delete, so both paths produce byte-identical score
//!   vectors for the same inputs.
//!
//! ```text
//! [ initial ] --initiate--> [ pending ] --complete--> [ completed ]
//!                                |                          ^
//!                                +--abandon (GC)--> [ failed ]
//! ```

mod gc;
mod service;

pub use gc::GcOutcome;
pub use service::{CreateMemoryRequest, SingleShotRequest, TransactionService};
