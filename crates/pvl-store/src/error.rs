use pvl_types::{ActorId, BatchId, LookupKey};

/// Errors from trace store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced actor does not exist.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The referenced batch does not exist.
    #[error("batch not found: {0}")]
    BatchNotFound(BatchId),

    /// An actor with the same id or external identity is already registered.
    #[error("actor already registered: {0}")]
    DuplicateActor(String),

    /// A batch with the same id already exists.
    #[error("batch already exists: {0}")]
    DuplicateBatch(BatchId),

    /// The lookup key is already assigned to another batch.
    #[error("lookup key already in use: {0}")]
    KeyCollision(LookupKey),

    /// The entry's sequence number is not the next one for its batch.
    #[error("sequence conflict on batch {batch}: expected {expected}, got {actual}")]
    SequenceConflict {
        batch: BatchId,
        expected: u64,
        actual: u64,
    },

    /// The entry does not point at the current tail of its chain.
    #[error("entry {sequence} of batch {batch} does not link to the current tail")]
    StaleTail { batch: BatchId, sequence: u64 },

    /// The entry cannot be committed as submitted.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The backend cannot serve requests (outage, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The persisted log could not be replayed.
    #[error("corrupt log: {0}")]
    Corrupt(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// `true` when the failure says nothing about the request itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_) | Self::Serialization(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".into())
}
