//! Hashing primitives for the Provenance Ledger.
//!
//! Provides domain-separated BLAKE3 hashing and per-batch hash chain
//! verification. All crypto operations wrap established libraries; there is
//! no custom cryptography here.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::ContentHasher;
