use std::time::Duration;

use pvl_gate::{Denial, GateError};
use pvl_ledger::LedgerError;
use pvl_store::StoreError;
use pvl_types::{BatchId, TypeError};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the command and query services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("illegal transition: {0}")]
    IllegalTransition(Denial),

    #[error("actor already registered: {0}")]
    DuplicateActor(String),

    #[error("lookup key collision: {0}")]
    KeyCollision(String),

    #[error("chain integrity violation in batch {batch} at sequence {sequence}")]
    ChainIntegrityViolation { batch: BatchId, sequence: u64 },

    #[error("batch {batch} is busy (waited {}ms)", waited.as_millis())]
    Busy { batch: BatchId, waited: Duration },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse error classes for mapping onto a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    IllegalState,
    Forbidden,
    Conflict,
    Integrity,
    Busy,
    Unavailable,
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::IllegalState => "illegal-state",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Integrity => "integrity",
            Self::Busy => "busy",
            Self::Unavailable => "unavailable",
            Self::InvalidInput => "invalid-input",
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::IllegalTransition(denial) if denial.is_authorization() => ErrorKind::Forbidden,
            Self::IllegalTransition(_) => ErrorKind::IllegalState,
            Self::DuplicateActor(_) | Self::KeyCollision(_) => ErrorKind::Conflict,
            Self::ChainIntegrityViolation { .. } => ErrorKind::Integrity,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::StorageUnavailable(_) => ErrorKind::Unavailable,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn actor_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("actor {id}"))
    }

    pub(crate) fn batch_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("batch {id}"))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActorNotFound(id) => Self::actor_not_found(id),
            StoreError::BatchNotFound(id) => Self::batch_not_found(id),
            StoreError::DuplicateActor(who) => Self::DuplicateActor(who),
            StoreError::KeyCollision(key) => Self::KeyCollision(key.to_string()),
            // Another writer extended the chain first.
            StoreError::SequenceConflict { batch, .. } | StoreError::StaleTail { batch, .. } => {
                Self::Busy {
                    batch,
                    waited: Duration::ZERO,
                }
            }
            StoreError::DuplicateBatch(_) | StoreError::InvalidRecord(_) => {
                Self::InvalidInput(err.to_string())
            }
            StoreError::Unavailable(_)
            | StoreError::Corrupt(_)
            | StoreError::Serialization(_)
            | StoreError::Io(_) => Self::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BatchNotFound(id) => Self::batch_not_found(id),
            LedgerError::IntegrityViolation { batch, sequence, .. } => {
                Self::ChainIntegrityViolation { batch, sequence }
            }
            LedgerError::Store(inner) => inner.into(),
        }
    }
}

impl From<TypeError> for ServiceError {
    fn from(err: TypeError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<GateError> for ServiceError {
    fn from(err: GateError) -> Self {
        Self::InvalidInput(format!("gate: {err}"))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
