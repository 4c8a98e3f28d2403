use pvl_store::StoreError;
use pvl_types::BatchId;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("batch not found: {0}")]
    BatchNotFound(BatchId),

    #[error("integrity violation in batch {batch} at sequence {sequence}: {reason}")]
    IntegrityViolation {
        batch: BatchId,
        sequence: u64,
        reason: String,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
