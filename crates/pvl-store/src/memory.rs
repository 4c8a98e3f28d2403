use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pvl_types::{Actor, ActorId, Batch, BatchId, LedgerEntry, LookupKey};

use crate::error::{poisoned, StoreError, StoreResult};
use crate::tables::Tables;
use crate::traits::{ActorStore, BatchStore, EntryStore, TraceStore};

/// In-memory trace store.
///
/// Intended for tests and embedding. All tables live behind one `RwLock`, so
/// every commit is atomic with respect to every read. The store can be marked
/// unavailable to exercise outage handling in callers.
pub struct InMemoryTraceStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
}

impl InMemoryTraceStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.ensure_available()?;
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.ensure_available()?;
        self.tables.write().map_err(poisoned)
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        }
    }

    /// Overwrite a stored entry in place, bypassing every check.
    #[cfg(feature = "fault-injection")]
    pub fn tamper_entry(
        &self,
        batch: &BatchId,
        sequence: u64,
        tamper: impl FnOnce(&mut LedgerEntry),
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let entry = tables
            .entry_mut(batch, sequence)
            .ok_or(StoreError::BatchNotFound(*batch))?;
        tamper(entry);
        Ok(())
    }

    /// Overwrite a stored batch record in place, bypassing every check.
    #[cfg(feature = "fault-injection")]
    pub fn tamper_batch(&self, id: &BatchId, tamper: impl FnOnce(&mut Batch)) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let batch = tables.batch_mut(id).ok_or(StoreError::BatchNotFound(*id))?;
        tamper(batch);
        Ok(())
    }
}

impl Default for InMemoryTraceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorStore for InMemoryTraceStore {
    fn insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.check_insert_actor(actor)?;
        tables.apply_insert_actor(actor.clone());
        Ok(())
    }

    fn update_actor(&self, actor: &Actor) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.check_update_actor(actor)?;
        tables.apply_update_actor(actor.clone());
        Ok(())
    }

    fn actor(&self, id: &ActorId) -> StoreResult<Option<Actor>> {
        Ok(self.read()?.actor(id).cloned())
    }

    fn actor_by_identity(&self, identity: &str) -> StoreResult<Option<Actor>> {
        Ok(self.read()?.actor_by_identity(identity).cloned())
    }

    fn actors(&self) -> StoreResult<Vec<Actor>> {
        Ok(self.read()?.actors())
    }
}

impl BatchStore for InMemoryTraceStore {
    fn batch(&self, id: &BatchId) -> StoreResult<Option<Batch>> {
        Ok(self.read()?.batch(id).cloned())
    }

    fn batch_by_lookup_key(&self, key: &LookupKey) -> StoreResult<Option<Batch>> {
        Ok(self.read()?.batch_by_lookup_key(key).cloned())
    }

    fn batches_by_owner(&self, owner: &ActorId) -> StoreResult<Vec<Batch>> {
        Ok(self
            .read()?
            .batches()
            .filter(|batch| batch.owner == *owner)
            .cloned()
            .collect())
    }

    fn batches(&self) -> StoreResult<Vec<Batch>> {
        Ok(self.read()?.batches().cloned().collect())
    }
}

impl EntryStore for InMemoryTraceStore {
    fn entries(&self, batch: &BatchId) -> StoreResult<Vec<LedgerEntry>> {
        Ok(self.read()?.entries(batch).to_vec())
    }

    fn tail(&self, batch: &BatchId) -> StoreResult<Option<LedgerEntry>> {
        Ok(self.read()?.entries(batch).last().cloned())
    }

    fn entries_by_actor(&self, actor: &ActorId) -> StoreResult<Vec<LedgerEntry>> {
        Ok(self.read()?.entries_by_actor(actor))
    }

    fn entry_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.entry_count())
    }
}

impl TraceStore for InMemoryTraceStore {
    fn commit_genesis(&self, batch: &Batch, genesis: &LedgerEntry) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.check_genesis(batch, genesis)?;
        tables.apply_genesis(batch.clone(), genesis.clone());
        Ok(())
    }

    fn commit_transition(&self, entry: &LedgerEntry) -> StoreResult<Batch> {
        let mut tables = self.write()?;
        tables.check_transition(entry)?;
        tables
            .apply_transition(entry.clone())
            .ok_or(StoreError::BatchNotFound(entry.batch_id))
    }
}

impl std::fmt::Debug for InMemoryTraceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryTraceStore");
        if let Ok(tables) = self.tables.read() {
            s.field("actors", &tables.actors().len())
                .field("batches", &tables.batches().count())
                .field("entries", &tables.entry_count());
        }
        s.field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch_with_genesis, next_entry, producer};
    use pvl_types::{BatchStatus, EntryHash, LedgerAction};

    #[test]
    fn actor_insert_and_lookup() {
        let store = InMemoryTraceStore::new();
        let actor = producer("farmer@test.com");
        store.insert_actor(&actor).unwrap();

        assert_eq!(store.actor(&actor.id).unwrap(), Some(actor.clone()));
        assert_eq!(
            store.actor_by_identity("FARMER@test.com").unwrap(),
            Some(actor.clone())
        );
        assert_eq!(store.actors().unwrap(), vec![actor]);
    }

    #[test]
    fn duplicate_identity_rejected() {
        let store = InMemoryTraceStore::new();
        store.insert_actor(&producer("farmer@test.com")).unwrap();
        let err = store.insert_actor(&producer("farmer@test.com")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateActor(_)));
        assert_eq!(store.actors().unwrap().len(), 1);
    }

    #[test]
    fn update_only_touches_display_metadata() {
        let store = InMemoryTraceStore::new();
        let actor = producer("farmer@test.com");
        store.insert_actor(&actor).unwrap();

        let mut renamed = actor.clone();
        renamed.display_name = "Farm Co-op".into();
        store.update_actor(&renamed).unwrap();
        assert_eq!(
            store.actor(&actor.id).unwrap().unwrap().display_name,
            "Farm Co-op"
        );

        let mut promoted = renamed.clone();
        promoted.role = pvl_types::Role::Administrator;
        assert!(matches!(
            store.update_actor(&promoted),
            Err(StoreError::InvalidRecord(_))
        ));
    }

    #[test]
    fn genesis_commit_creates_batch_and_chain() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        store.commit_genesis(&batch, &genesis).unwrap();

        assert_eq!(store.batch(&batch.id).unwrap(), Some(batch.clone()));
        assert_eq!(
            store.batch_by_lookup_key(&batch.lookup_key).unwrap(),
            Some(batch.clone())
        );
        assert_eq!(store.entries(&batch.id).unwrap(), vec![genesis.clone()]);
        assert_eq!(store.tail(&batch.id).unwrap(), Some(genesis));
        assert_eq!(store.batches_by_owner(&owner.id).unwrap(), vec![batch]);
    }

    #[test]
    fn duplicate_lookup_key_is_a_collision() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        store.commit_genesis(&batch, &genesis).unwrap();

        let (mut other, mut other_genesis) = batch_with_genesis(&owner, "Basil");
        other.lookup_key = batch.lookup_key.clone();
        other_genesis.batch_id = other.id;
        let err = store.commit_genesis(&other, &other_genesis).unwrap_err();
        assert!(matches!(err, StoreError::KeyCollision(_)));
        assert!(store.batch(&other.id).unwrap().is_none());
        assert!(store.lookup_key_taken(&batch.lookup_key).unwrap());
    }

    #[test]
    fn genesis_must_start_the_chain() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, mut genesis) = batch_with_genesis(&owner, "Tomatoes");
        genesis.prev_entry_hash = EntryHash::from_bytes([7; 32]);
        assert!(matches!(
            store.commit_genesis(&batch, &genesis),
            Err(StoreError::InvalidRecord(_))
        ));
        assert_eq!(store.entry_count().unwrap(), 0);
    }

    #[test]
    fn transition_moves_status_with_the_tail() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        store.commit_genesis(&batch, &genesis).unwrap();

        let entry = next_entry(&genesis, LedgerAction::Dispatch);
        let updated = store.commit_transition(&entry).unwrap();
        assert_eq!(updated.status, BatchStatus::InTransit);
        assert_eq!(store.batch(&batch.id).unwrap().unwrap().status, BatchStatus::InTransit);
        assert_eq!(store.entries(&batch.id).unwrap().len(), 2);
        assert_eq!(store.entries_by_actor(&owner.id).unwrap().len(), 2);
        assert_eq!(store.entry_count().unwrap(), 2);
    }

    #[test]
    fn stale_writers_cannot_both_append() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        store.commit_genesis(&batch, &genesis).unwrap();

        let first = next_entry(&genesis, LedgerAction::Dispatch);
        let second = next_entry(&genesis, LedgerAction::Dispatch);
        store.commit_transition(&first).unwrap();
        let err = store.commit_transition(&second).unwrap_err();
        assert!(matches!(
            err,
            StoreError::SequenceConflict {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn wrong_prev_hash_is_stale_tail() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        store.commit_genesis(&batch, &genesis).unwrap();

        let mut entry = next_entry(&genesis, LedgerAction::Dispatch);
        entry.prev_entry_hash = EntryHash::from_bytes([3; 32]);
        assert!(matches!(
            store.commit_transition(&entry),
            Err(StoreError::StaleTail { sequence: 1, .. })
        ));
        assert_eq!(store.batch(&batch.id).unwrap().unwrap().status, BatchStatus::Harvested);
    }

    #[test]
    fn transition_on_unknown_batch() {
        let store = InMemoryTraceStore::new();
        let owner = producer("farmer@test.com");
        let (_, genesis) = batch_with_genesis(&owner, "Tomatoes");
        let entry = next_entry(&genesis, LedgerAction::Dispatch);
        assert!(matches!(
            store.commit_transition(&entry),
            Err(StoreError::BatchNotFound(_))
        ));
    }

    #[test]
    fn outage_fails_reads_and_writes() {
        let store = InMemoryTraceStore::new();
        store.set_available(false);
        let err = store.insert_actor(&producer("a@test.com")).unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.actors().is_err());

        store.set_available(true);
        assert!(store.actors().unwrap().is_empty());
    }
}
