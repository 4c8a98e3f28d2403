use pvl_types::{EntryHash, LedgerEntry};

use crate::hasher::ContentHasher;

/// Trait for records that participate in a per-batch hash chain.
pub trait ChainLink {
    /// Position of the record in its chain.
    fn sequence_no(&self) -> u64;
    /// The record's own stored hash.
    fn link_hash(&self) -> EntryHash;
    /// The stored hash of the predecessor ([`EntryHash::GENESIS`] for the first record).
    fn prev_link(&self) -> EntryHash;
    /// Canonical payload bytes the link hash is computed over.
    fn payload_bytes(&self) -> Vec<u8>;
}

impl ChainLink for LedgerEntry {
    fn sequence_no(&self) -> u64 {
        self.sequence_no
    }

    fn link_hash(&self) -> EntryHash {
        self.entry_hash
    }

    fn prev_link(&self) -> EntryHash {
        self.prev_entry_hash
    }

    fn payload_bytes(&self) -> Vec<u8> {
        self.canonical_payload()
    }
}

/// Hash chain integrity verifier.
///
/// A chain is valid when sequence numbers run 0, 1, 2, ... without gaps, the
/// first record points at [`EntryHash::GENESIS`], every later record points
/// at its predecessor's stored hash, and every stored hash equals the hash
/// recomputed from the record's payload.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, reporting the first failing index.
    pub fn verify_chain<L: ChainLink>(links: &[L]) -> Result<(), ChainError> {
        let mut expected_prev = EntryHash::GENESIS;
        for (index, link) in links.iter().enumerate() {
            if link.sequence_no() != index as u64 {
                return Err(ChainError::SequenceGap {
                    index,
                    expected: index as u64,
                    actual: link.sequence_no(),
                });
            }
            if link.prev_link() != expected_prev {
                return Err(if index == 0 {
                    ChainError::GenesisLinkMismatch
                } else {
                    ChainError::BrokenLink { index }
                });
            }
            if !ContentHasher::ENTRY.verify(&link.payload_bytes(), &link.link_hash()) {
                return Err(ChainError::HashMismatch { index });
            }
            expected_prev = link.link_hash();
        }
        Ok(())
    }

    /// Compute the expected link hash for a canonical payload.
    ///
    /// The payload already contains the predecessor's hash, so the chain is
    /// carried through the payload rather than mixed in separately.
    pub fn compute_hash(payload: &[u8]) -> EntryHash {
        ContentHasher::ENTRY.hash(payload)
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first entry does not point at the genesis hash")]
    GenesisLinkMismatch,

    #[error("sequence gap at index {index}: expected {expected}, found {actual}")]
    SequenceGap {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("broken link at index {index}: prev hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

impl ChainError {
    /// Index of the first record that failed verification.
    pub fn index(&self) -> usize {
        match self {
            Self::GenesisLinkMismatch => 0,
            Self::SequenceGap { index, .. }
            | Self::BrokenLink { index }
            | Self::HashMismatch { index } => *index,
        }
    }
}
