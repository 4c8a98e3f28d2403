use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("invalid lookup key: {0}")]
    InvalidLookupKey(String),

    #[error("invalid batch details: {0}")]
    InvalidDetails(String),
}
