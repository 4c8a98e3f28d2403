use pvl_crypto::HashChainVerifier;
use pvl_types::{ActorId, BatchId, EntryHash, LedgerAction, LedgerEntry, Role, Timestamp};

/// Where the next entry of a batch attaches to its chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainPosition {
    pub next_sequence: u64,
    pub prev_hash: EntryHash,
    pub last_timestamp: Option<Timestamp>,
}

impl ChainPosition {
    /// Position of a batch with no entries yet.
    pub const fn genesis() -> Self {
        Self {
            next_sequence: 0,
            prev_hash: EntryHash::GENESIS,
            last_timestamp: None,
        }
    }

    /// Position directly after `tail`.
    pub fn after(tail: &LedgerEntry) -> Self {
        Self {
            next_sequence: tail.sequence_no + 1,
            prev_hash: tail.entry_hash,
            last_timestamp: Some(tail.timestamp),
        }
    }

    /// Position after the optional tail of a chain.
    pub fn from_tail(tail: Option<&LedgerEntry>) -> Self {
        tail.map(Self::after).unwrap_or_else(Self::genesis)
    }
}

/// Everything about a new entry that the caller decides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDraft {
    pub batch_id: BatchId,
    pub actor_id: ActorId,
    pub actor_role: Role,
    pub action: LedgerAction,
    pub location: String,
    pub notes: Option<String>,
}

/// Attach `draft` at `position` and compute its hash.
///
/// The entry's timestamp is `clock`, bumped past the previous entry's
/// timestamp if the clock has not advanced.
pub fn seal(draft: EntryDraft, position: ChainPosition, clock: Timestamp) -> LedgerEntry {
    let mut entry = LedgerEntry {
        sequence_no: position.next_sequence,
        batch_id: draft.batch_id,
        actor_id: draft.actor_id,
        actor_role_at_time: draft.actor_role,
        action: draft.action,
        prev_entry_hash: position.prev_hash,
        entry_hash: EntryHash::GENESIS,
        timestamp: clock.successor_of(position.last_timestamp.as_ref()),
        location: draft.location,
        notes: draft.notes,
    };
    entry.entry_hash = HashChainVerifier::compute_hash(&entry.canonical_payload());
    entry
}
