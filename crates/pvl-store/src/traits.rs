use pvl_types::{Actor, ActorId, Batch, BatchId, LedgerEntry, LookupKey};

use crate::error::StoreResult;

/// Registered actors.
///
/// Actors are never deleted. Only display metadata may change after the
/// initial insert; id, role, and external identity are fixed.
pub trait ActorStore: Send + Sync {
    /// Insert a new actor.
    ///
    /// Fails with `DuplicateActor` if the id or the external identity is
    /// already present.
    fn insert_actor(&self, actor: &Actor) -> StoreResult<()>;

    /// Replace the display metadata of an existing actor.
    ///
    /// Fails with `ActorNotFound` for unknown ids and `InvalidRecord` if the
    /// update tries to change an immutable field.
    fn update_actor(&self, actor: &Actor) -> StoreResult<()>;

    /// Read an actor by id. Returns `Ok(None)` if it does not exist.
    fn actor(&self, id: &ActorId) -> StoreResult<Option<Actor>>;

    /// Read an actor by its (lower-cased) external identity.
    fn actor_by_identity(&self, identity: &str) -> StoreResult<Option<Actor>>;

    /// All actors in registration order.
    fn actors(&self) -> StoreResult<Vec<Actor>>;
}

/// Current-state batch records.
///
/// Batches cannot be written here: batches are created
/// and their status changed only through [`TraceStore`].
pub trait BatchStore: Send + Sync {
    /// Read a batch by id.
    fn batch(&self, id: &BatchId) -> StoreResult<Option<Batch>>;

    /// Read a batch by its lookup key.
    fn batch_by_lookup_key(&self, key: &LookupKey) -> StoreResult<Option<Batch>>;

    /// Batches owned by `owner`, in creation order.
    fn batches_by_owner(&self, owner: &ActorId) -> StoreResult<Vec<Batch>>;

    /// All batches in creation order.
    fn batches(&self) -> StoreResult<Vec<Batch>>;

    /// Whether `key` is already assigned.
    fn lookup_key_taken(&self, key: &LookupKey) -> StoreResult<bool> {
        Ok(self.batch_by_lookup_key(key)?.is_some())
    }
}

/// Append-only per-batch ledger entries.
pub trait EntryStore: Send + Sync {
    /// All entries of a batch ascending by sequence number. Empty for unknown batches.
    fn entries(&self, batch: &BatchId) -> StoreResult<Vec<LedgerEntry>>;

    /// The most recent entry of a batch.
    fn tail(&self, batch: &BatchId) -> StoreResult<Option<LedgerEntry>>;

    /// Entries appended by `actor` across all batches, in append order per batch.
    fn entries_by_actor(&self, actor: &ActorId) -> StoreResult<Vec<LedgerEntry>>;

    /// Total number of entries across all batches.
    fn entry_count(&self) -> StoreResult<usize>;
}

/// The atomic commit boundary between batches and their ledgers.
///
/// Every mutation that touches both a batch record and its chain goes through
/// one of these methods, which either apply completely or not at all.
pub trait TraceStore: ActorStore + BatchStore + EntryStore {
    /// Insert a new batch together with its genesis entry.
    ///
    /// Fails with `DuplicateBatch`, `KeyCollision`, or `InvalidRecord` (genesis
    /// not at sequence 0, not linked to the genesis hash, or for another batch).
    fn commit_genesis(&self, batch: &Batch, genesis: &LedgerEntry) -> StoreResult<()>;

    /// Append `entry` and set the batch status to its resulting status.
    ///
    /// Re-checks under the store's write lock that the entry extends the
    /// current tail: `SequenceConflict` if the sequence number is not next,
    /// `StaleTail` if `prev_entry_hash` is not the tail's hash. Returns the
    /// updated batch.
    fn commit_transition(&self, entry: &LedgerEntry) -> StoreResult<Batch>;
}
