use pvl_types::{ActorId, BatchId, BatchStatus, LedgerEntry, Timestamp};

use crate::error::LedgerResult;
use crate::history::{history, LedgerReader};

/// State of a batch recomputed from its ledger alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub batch_id: BatchId,
    /// Resulting status of the tail entry; `None` for an empty chain.
    pub status: Option<BatchStatus>,
    pub entries_applied: u64,
    pub last_timestamp: Option<Timestamp>,
    /// Distinct actors in the order they first touched the batch.
    pub custody: Vec<ActorId>,
    /// Whether every entry advanced the lifecycle by exactly one step.
    pub lifecycle_consistent: bool,
}

/// Deterministic replay of batch chains.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Replay a stored batch from genesis.
    pub fn replay_batch<R: LedgerReader + ?Sized>(
        reader: &R,
        batch: &BatchId,
    ) -> LedgerResult<ReplayResult> {
        let entries = history(reader, batch)?;
        Ok(Self::replay_entries(batch, &entries))
    }

    /// Replay an already-loaded chain.
    pub fn replay_entries(batch: &BatchId, entries: &[LedgerEntry]) -> ReplayResult {
        let mut status: Option<BatchStatus> = None;
        let mut custody = Vec::new();
        let mut lifecycle_consistent = true;

        for entry in entries {
            let next = entry.resulting_status();
            let expected = match status {
                None => Some(BatchStatus::Harvested),
                Some(current) => current.successor(),
            };
            if expected != Some(next) {
                lifecycle_consistent = false;
            }
            status = Some(next);
            if !custody.contains(&entry.actor_id) {
                custody.push(entry.actor_id);
            }
        }

        ReplayResult {
            batch_id: *batch,
            status,
            entries_applied: entries.len() as u64,
            last_timestamp: entries.last().map(|e| e.timestamp),
            custody,
            lifecycle_consistent,
        }
    }
}
