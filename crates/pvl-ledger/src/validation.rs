use pvl_crypto::{ChainError, HashChainVerifier};
use pvl_types::{BatchId, BatchStatus, LedgerEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::history::{history, LedgerReader};
use crate::replay::ReplayEngine;

/// Result of verifying one batch's chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub batch_id: BatchId,
    pub entry_count: u64,
    pub valid: bool,
    /// Sequence position of the first entry that failed verification.
    pub broken_at_sequence: Option<u64>,
    pub violation: Option<Violation>,
}

impl ChainReport {
    /// Turn an invalid report into an `IntegrityViolation` error.
    pub fn into_result(self) -> LedgerResult<Self> {
        match (&self.violation, self.broken_at_sequence) {
            (Some(violation), Some(sequence)) => Err(LedgerError::IntegrityViolation {
                batch: self.batch_id,
                sequence,
                reason: violation.description.clone(),
            }),
            _ => Ok(self),
        }
    }
}

/// The first integrity failure found in a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub sequence: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    SequenceGap,
    GenesisLink,
    HashChainBreak,
    HashMismatch,
    ForeignEntry,
}

/// A batch whose stored status disagrees with the tail of its chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDivergence {
    pub batch_id: BatchId,
    pub stored_status: BatchStatus,
    /// Status implied by the ledger; `None` when the chain is empty.
    pub ledger_status: Option<BatchStatus>,
}

/// Result of auditing every batch in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub chains: Vec<ChainReport>,
    pub divergences: Vec<ViewDivergence>,
}

impl AuditReport {
    /// `true` when every chain verifies and every batch view matches its ledger.
    pub fn is_clean(&self) -> bool {
        self.divergences.is_empty() && self.chains.iter().all(|c| c.valid)
    }

    /// Reports of chains that failed verification.
    pub fn broken_chains(&self) -> impl Iterator<Item = &ChainReport> {
        self.chains.iter().filter(|c| !c.valid)
    }
}

/// Chain integrity validator.
pub struct StreamValidator;

impl StreamValidator {
    /// Verify a batch's chain as currently stored.
    pub fn verify_chain<R: LedgerReader + ?Sized>(
        reader: &R,
        batch: &BatchId,
    ) -> LedgerResult<ChainReport> {
        let entries = history(reader, batch)?;
        Ok(Self::validate_entries(batch, &entries))
    }

    /// Verify an already-loaded chain.
    ///
    /// Checks that every entry belongs to `batch`, that sequence numbers are
    /// contiguous from 0, that each entry links to its predecessor's hash, and
    /// that each stored hash matches the recomputed one.
    pub fn validate_entries(batch: &BatchId, entries: &[LedgerEntry]) -> ChainReport {
        let violation = match entries.iter().position(|e| e.batch_id != *batch) {
            Some(index) => Some(Violation {
                sequence: index as u64,
                kind: ViolationKind::ForeignEntry,
                description: format!(
                    "entry at index {index} belongs to batch {}",
                    entries[index].batch_id
                ),
            }),
            None => HashChainVerifier::verify_chain(entries)
                .err()
                .map(violation_from),
        };

        match &violation {
            Some(v) => warn!(batch = %batch, sequence = v.sequence, kind = ?v.kind, "chain verification failed"),
            None => debug!(batch = %batch, entries = entries.len(), "chain verified"),
        }

        ChainReport {
            batch_id: *batch,
            entry_count: entries.len() as u64,
            valid: violation.is_none(),
            broken_at_sequence: violation.as_ref().map(|v| v.sequence),
            violation,
        }
    }

    /// Verify every chain and compare every batch view with its ledger tail.
    pub fn audit_all<R: LedgerReader + ?Sized>(reader: &R) -> LedgerResult<AuditReport> {
        let mut report = AuditReport::default();
        for batch in reader.batches()? {
            let entries = reader.entries(&batch.id)?;
            report
                .chains
                .push(Self::validate_entries(&batch.id, &entries));

            let replay = ReplayEngine::replay_entries(&batch.id, &entries);
            if replay.status != Some(batch.status) {
                warn!(
                    batch = %batch.id,
                    stored = %batch.status,
                    ledger = ?replay.status,
                    "batch view diverges from ledger"
                );
                report.divergences.push(ViewDivergence {
                    batch_id: batch.id,
                    stored_status: batch.status,
                    ledger_status: replay.status,
                });
            }
        }
        Ok(report)
    }
}

fn violation_from(err: ChainError) -> Violation {
    let kind = match err {
        ChainError::SequenceGap { .. } => ViolationKind::SequenceGap,
        ChainError::GenesisLinkMismatch => ViolationKind::GenesisLink,
        ChainError::BrokenLink { .. } => ViolationKind::HashChainBreak,
        ChainError::HashMismatch { .. } => ViolationKind::HashMismatch,
    };
    Violation {
        sequence: err.index() as u64,
        kind,
        description: err.to_string(),
    }
}
