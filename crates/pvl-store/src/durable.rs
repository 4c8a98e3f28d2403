use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pvl_types::{Actor, ActorId, Batch, BatchId, LedgerEntry, LookupKey};
use tracing::info;

use crate::error::{poisoned, StoreError, StoreResult};
use crate::tables::Tables;
use crate::traits::{ActorStore, BatchStore, EntryStore, TraceStore};
use crate::wal::{SyncMode, WalRecord, WriteAheadLog};

/// File name of the log inside the data directory.
pub const WAL_FILE_NAME: &str = "ledger.wal";

/// WAL-backed trace store.
///
/// Every mutation is validated against the in-memory tables, appended to the
/// write-ahead log, and only then applied, all under the tables' write lock.
/// On open the log is replayed through the same validation, so the recovered
/// state is exactly the state that was acknowledged before shutdown.
pub struct DurableTraceStore {
    dir: PathBuf,
    wal: WriteAheadLog,
    tables: RwLock<Tables>,
}

impl DurableTraceStore {
    /// Open (or create) a store in `dir`, syncing on every write.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        Self::open_with(dir, SyncMode::EveryWrite)
    }

    /// Open (or create) a store in `dir` with an explicit sync mode.
    pub fn open_with(dir: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        let (wal, records) = WriteAheadLog::open(&dir.join(WAL_FILE_NAME), sync_mode)?;
        let replayed = records.len();

        let mut tables = Tables::default();
        for (index, record) in records.into_iter().enumerate() {
            tables
                .check_record(&record)
                .map_err(|e| StoreError::Corrupt(format!("record {index}: {e}")))?;
            tables.apply_record(record);
        }

        info!(
            dir = %dir.display(),
            records = replayed,
            batches = tables.batches().count(),
            entries = tables.entry_count(),
            "durable store recovered"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            wal,
            tables: RwLock::new(tables),
        })
    }

    /// Data directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(poisoned)
    }

    /// Check, log, then apply one record.
    fn commit(&self, tables: &mut Tables, record: WalRecord) -> StoreResult<()> {
        tables.check_record(&record)?;
        self.wal.append(&record)?;
        tables.apply_record(record);
        Ok(())
    }
}

impl ActorStore for DurableTraceStore {
    fn insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        let mut tables = self.write()?;
        self.commit(&mut tables, WalRecord::ActorRegistered(actor.clone()))
    }

    fn update_actor(&self, actor: &Actor) -> StoreResult<()> {
        let mut tables = self.write()?;
        self.commit(&mut tables, WalRecord::ActorUpdated(actor.clone()))
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

impl BatchStore for DurableTraceStore {
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

impl EntryStore for DurableTraceStore {
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

impl TraceStore for DurableTraceStore {
    fn commit_genesis(&self, batch: &Batch, genesis: &LedgerEntry) -> StoreResult<()> {
        let mut tables = self.write()?;
        self.commit(
            &mut tables,
            WalRecord::BatchCreated {
                batch: batch.clone(),
                genesis: genesis.clone(),
            },
        )
    }

    fn commit_transition(&self, entry: &LedgerEntry) -> StoreResult<Batch> {
        let mut tables = self.write()?;
        self.commit(
            &mut tables,
            WalRecord::EntryAppended {
                entry: entry.clone(),
            },
        )?;
        tables
            .batch(&entry.batch_id)
            .cloned()
            .ok_or(StoreError::BatchNotFound(entry.batch_id))
    }
}

impl std::fmt::Debug for DurableTraceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableTraceStore")
            .field("dir", &self.dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch_with_genesis, next_entry, producer};
    use pvl_types::{BatchStatus, LedgerAction};
    use std::fs::OpenOptions;

    #[test]
    fn reopen_restores_identical_state() {
        let dir = tempfile::tempdir().unwrap();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        let dispatch = next_entry(&genesis, LedgerAction::Dispatch);

        let snapshot = {
            let store = DurableTraceStore::open(dir.path()).unwrap();
            store.insert_actor(&owner).unwrap();
            let mut renamed = owner.clone();
            renamed.location = Some("Fresno, USA".into());
            store.update_actor(&renamed).unwrap();
            store.commit_genesis(&batch, &genesis).unwrap();
            store.commit_transition(&dispatch).unwrap();
            let snapshot = store.read().unwrap().clone();
            snapshot
        };

        let reopened = DurableTraceStore::open(dir.path()).unwrap();
        assert_eq!(*reopened.read().unwrap(), snapshot);
        assert_eq!(
            reopened.batch(&batch.id).unwrap().unwrap().status,
            BatchStatus::InTransit
        );
        assert_eq!(reopened.entries(&batch.id).unwrap(), vec![genesis, dispatch]);
        assert_eq!(
            reopened.actor(&owner.id).unwrap().unwrap().location.as_deref(),
            Some("Fresno, USA")
        );
    }

    #[test]
    fn rejected_commits_are_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");

        let store = DurableTraceStore::open(dir.path()).unwrap();
        store.commit_genesis(&batch, &genesis).unwrap();
        let len_before = std::fs::metadata(dir.path().join(WAL_FILE_NAME)).unwrap().len();

        let stale = next_entry(&next_entry(&genesis, LedgerAction::Dispatch), LedgerAction::Deliver);
        assert!(store.commit_transition(&stale).is_err());
        let len_after = std::fs::metadata(dir.path().join(WAL_FILE_NAME)).unwrap().len();
        assert_eq!(len_before, len_after);
        assert_eq!(store.entry_count().unwrap(), 1);
    }

    #[test]
    fn torn_tail_drops_only_the_last_commit() {
        let dir = tempfile::tempdir().unwrap();
        let owner = producer("farmer@test.com");
        let (batch, genesis) = batch_with_genesis(&owner, "Tomatoes");
        let dispatch = next_entry(&genesis, LedgerAction::Dispatch);
        {
            let store = DurableTraceStore::open(dir.path()).unwrap();
            store.commit_genesis(&batch, &genesis).unwrap();
            store.commit_transition(&dispatch).unwrap();
        }

        let path = dir.path().join(WAL_FILE_NAME);
        let len = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(len - 3)
            .unwrap();

        let store = DurableTraceStore::open(dir.path()).unwrap();
        assert_eq!(store.entries(&batch.id).unwrap(), vec![genesis]);
        assert_eq!(store.batch(&batch.id).unwrap().unwrap().status, BatchStatus::Harvested);

        store.commit_transition(&dispatch).unwrap();
        drop(store);
        let store = DurableTraceStore::open(dir.path()).unwrap();
        assert_eq!(store.entries(&batch.id).unwrap().len(), 2);
    }

    /// Start offsets of every frame in a well-formed log.
    fn frame_offsets(path: &Path) -> Vec<u64> {
        let bytes = std::fs::read(path).unwrap();
        let mut offsets = Vec::new();
        let mut at = 0usize;
        while at < bytes.len() {
            offsets.push(at as u64);
            let len = u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap()) as usize;
            at += 8 + len;
        }
        offsets
    }

    /// Two batches, the first with a dispatch entry between their genesis records.
    fn three_record_log(dir: &Path) -> (Batch, Batch) {
        let owner = producer("farmer@test.com");
        let (first, genesis) = batch_with_genesis(&owner, "Tomatoes");
        let (second, second_genesis) = batch_with_genesis(&owner, "Basil");
        let store = DurableTraceStore::open(dir).unwrap();
        store.commit_genesis(&first, &genesis).unwrap();
        store
            .commit_transition(&next_entry(&genesis, LedgerAction::Dispatch))
            .unwrap();
        store.commit_genesis(&second, &second_genesis).unwrap();
        (first, second)
    }

    #[test]
    fn flipped_byte_mid_log_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        three_record_log(dir.path());
        let path = dir.path().join(WAL_FILE_NAME);
        let offsets = frame_offsets(&path);
        let len = std::fs::metadata(&path).unwrap().len();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[offsets[1] as usize + 12] ^= 0x01;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            DurableTraceStore::open(dir.path()),
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    }

    #[test]
    fn bad_length_mid_log_fails_open_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = three_record_log(dir.path());
        let path = dir.path().join(WAL_FILE_NAME);
        let offsets = frame_offsets(&path);
        let original = std::fs::read(&path).unwrap();

        let mut bytes = original.clone();
        let at = offsets[1] as usize;
        bytes[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            DurableTraceStore::open(dir.path()),
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);

        std::fs::write(&path, &original).unwrap();
        let store = DurableTraceStore::open(dir.path()).unwrap();
        assert_eq!(store.entries(&first.id).unwrap().len(), 2);
        assert!(store.batch(&second.id).unwrap().is_some());
    }
}
