mod attribution_error;
mod hindsight_error;
mod provenance_error;
mod storage_error;
mod transaction_error;

pub use attribution_error::AttributionError;
pub use hindsight_error::{HindsightError, HindsightResult};
pub use provenance_error::ProvenanceError;
pub use storage_error::StorageError;
pub use transaction_error::TransactionError;
