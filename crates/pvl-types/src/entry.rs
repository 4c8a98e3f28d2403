use serde::{Deserialize, Serialize};

use crate::digest::EntryHash;
use crate::ids::{ActorId, BatchId};
use crate::role::Role;
use crate::status::{BatchStatus, LedgerAction};
use crate::temporal::Timestamp;

/// One immutable record in a batch's hash chain.
///
/// `entry_hash` covers every other field (see [`LedgerEntry::canonical_payload`]),
/// and `prev_entry_hash` is the predecessor's `entry_hash`, so altering or
/// dropping any historical entry invalidates every later hash in the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the batch's chain, starting at 0 for the genesis entry.
    pub sequence_no: u64,
    pub batch_id: BatchId,
    pub actor_id: ActorId,
    /// Role the actor held when appending; roles never change, but the entry
    /// must stand on its own without a directory lookup.
    pub actor_role_at_time: Role,
    pub action: LedgerAction,
    pub prev_entry_hash: EntryHash,
    pub entry_hash: EntryHash,
    pub timestamp: Timestamp,
    pub location: String,
    pub notes: Option<String>,
}

/// Field order here is the hash encoding; never reorder.
#[derive(Serialize)]
struct CanonicalEntry<'a> {
    prev_entry_hash: &'a str,
    batch_id: &'a BatchId,
    actor_id: &'a ActorId,
    actor_role_at_time: Role,
    action: LedgerAction,
    timestamp_ms: u64,
    timestamp_logical: u32,
    location: &'a str,
    notes: Option<&'a str>,
    sequence_no: u64,
}

impl LedgerEntry {
    /// Deterministic byte encoding of every field except `entry_hash`.
    pub fn canonical_payload(&self) -> Vec<u8> {
        let prev = self.prev_entry_hash.to_hex();
        let canonical = CanonicalEntry {
            prev_entry_hash: &prev,
            batch_id: &self.batch_id,
            actor_id: &self.actor_id,
            actor_role_at_time: self.actor_role_at_time,
            action: self.action,
            timestamp_ms: self.timestamp.unix_ms,
            timestamp_logical: self.timestamp.logical,
            location: &self.location,
            notes: self.notes.as_deref(),
            sequence_no: self.sequence_no,
        };
        // A struct of strings, integers, and unit enums cannot fail to encode.
        serde_json::to_vec(&canonical).unwrap_or_default()
    }

    /// Status the batch holds while this entry is the tail.
    pub fn resulting_status(&self) -> BatchStatus {
        self.action.resulting_status()
    }

    /// `true` for sequence number 0.
    pub fn is_genesis(&self) -> bool {
        self.sequence_no == 0
    }
}
