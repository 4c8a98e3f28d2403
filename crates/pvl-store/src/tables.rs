use std::collections::HashMap;

use pvl_types::{Actor, ActorId, Batch, BatchId, EntryHash, LedgerEntry, LookupKey};

use crate::error::{StoreError, StoreResult};
use crate::wal::WalRecord;

/// In-memory tables shared by every backend.
///
/// Each mutation is split into a `check_*` step that validates against the
/// current state without touching it, and an `apply_*` step that cannot fail.
/// Backends run the check, persist if they need to, then apply, so a failed
/// request leaves the tables untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tables {
    actors: HashMap<ActorId, Actor>,
    actor_order: Vec<ActorId>,
    identities: HashMap<String, ActorId>,
    batches: HashMap<BatchId, Batch>,
    batch_order: Vec<BatchId>,
    lookup: HashMap<LookupKey, BatchId>,
    entries: HashMap<BatchId, Vec<LedgerEntry>>,
    entry_count: usize,
}

impl Tables {
    // -----------------------------------------------------------------------
    // Actors
    // -----------------------------------------------------------------------

    pub fn check_insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        if self.actors.contains_key(&actor.id) {
            return Err(StoreError::DuplicateActor(actor.id.to_string()));
        }
        if let Some(identity) = &actor.external_identity {
            if self.identities.contains_key(identity) {
                return Err(StoreError::DuplicateActor(identity.clone()));
            }
        }
        Ok(())
    }

    pub fn apply_insert_actor(&mut self, actor: Actor) {
        if let Some(identity) = &actor.external_identity {
            self.identities.insert(identity.clone(), actor.id);
        }
        self.actor_order.push(actor.id);
        self.actors.insert(actor.id, actor);
    }

    pub fn check_update_actor(&self, actor: &Actor) -> StoreResult<()> {
        let current = self
            .actors
            .get(&actor.id)
            .ok_or(StoreError::ActorNotFound(actor.id))?;
        if current.role != actor.role
            || current.external_identity != actor.external_identity
            || current.registered_at != actor.registered_at
        {
            return Err(StoreError::InvalidRecord(format!(
                "actor {} may only change display metadata",
                actor.id
            )));
        }
        Ok(())
    }

    pub fn apply_update_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_by_identity(&self, identity: &str) -> Option<&Actor> {
        self.identities
            .get(&identity.to_lowercase())
            .and_then(|id| self.actors.get(id))
    }

    pub fn actors(&self) -> Vec<Actor> {
        self.actor_order
            .iter()
            .filter_map(|id| self.actors.get(id).cloned())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Batches and their chains
    // -----------------------------------------------------------------------

    pub fn check_genesis(&self, batch: &Batch, genesis: &LedgerEntry) -> StoreResult<()> {
        if self.batches.contains_key(&batch.id) {
            return Err(StoreError::DuplicateBatch(batch.id));
        }
        if self.lookup.contains_key(&batch.lookup_key) {
            return Err(StoreError::KeyCollision(batch.lookup_key.clone()));
        }
        if genesis.batch_id != batch.id {
            return Err(StoreError::InvalidRecord(format!(
                "genesis entry belongs to batch {}, not {}",
                genesis.batch_id, batch.id
            )));
        }
        if genesis.sequence_no != 0 || genesis.prev_entry_hash != EntryHash::GENESIS {
            return Err(StoreError::InvalidRecord(
                "genesis entry must have sequence 0 and the genesis prev hash".into(),
            ));
        }
        if genesis.resulting_status() != batch.status {
            return Err(StoreError::InvalidRecord(format!(
                "batch status {} does not match genesis action {}",
                batch.status, genesis.action
            )));
        }
        Ok(())
    }

    pub fn apply_genesis(&mut self, batch: Batch, genesis: LedgerEntry) {
        self.lookup.insert(batch.lookup_key.clone(), batch.id);
        self.batch_order.push(batch.id);
        self.entries.insert(batch.id, vec![genesis]);
        self.entry_count += 1;
        self.batches.insert(batch.id, batch);
    }

    pub fn check_transition(&self, entry: &LedgerEntry) -> StoreResult<()> {
        if !self.batches.contains_key(&entry.batch_id) {
            return Err(StoreError::BatchNotFound(entry.batch_id));
        }
        let chain = self
            .entries
            .get(&entry.batch_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let expected = chain.len() as u64;
        if entry.sequence_no != expected {
            return Err(StoreError::SequenceConflict {
                batch: entry.batch_id,
                expected,
                actual: entry.sequence_no,
            });
        }
        let tail_hash = chain
            .last()
            .map(|tail| tail.entry_hash)
            .unwrap_or(EntryHash::GENESIS);
        if entry.prev_entry_hash != tail_hash {
            return Err(StoreError::StaleTail {
                batch: entry.batch_id,
                sequence: entry.sequence_no,
            });
        }
        Ok(())
    }

    /// Append a checked entry and move the batch view with it.
    pub fn apply_transition(&mut self, entry: LedgerEntry) -> Option<Batch> {
        let status = entry.resulting_status();
        let batch = self.batches.get_mut(&entry.batch_id)?;
        batch.status = status;
        let batch = batch.clone();
        self.entries.entry(entry.batch_id).or_default().push(entry);
        self.entry_count += 1;
        Some(batch)
    }

    pub fn batch(&self, id: &BatchId) -> Option<&Batch> {
        self.batches.get(id)
    }

    pub fn batch_by_lookup_key(&self, key: &LookupKey) -> Option<&Batch> {
        self.lookup.get(key).and_then(|id| self.batches.get(id))
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batch_order.iter().filter_map(|id| self.batches.get(id))
    }

    pub fn entries(&self, batch: &BatchId) -> &[LedgerEntry] {
        self.entries.get(batch).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn entries_by_actor(&self, actor: &ActorId) -> Vec<LedgerEntry> {
        self.batch_order
            .iter()
            .flat_map(|id| self.entries(id))
            .filter(|entry| entry.actor_id == *actor)
            .cloned()
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    // -----------------------------------------------------------------------
    // Log records
    // -----------------------------------------------------------------------

    /// Validate a logged record against the current state.
    pub fn check_record(&self, record: &WalRecord) -> StoreResult<()> {
        match record {
            WalRecord::ActorRegistered(actor) => self.check_insert_actor(actor),
            WalRecord::ActorUpdated(actor) => self.check_update_actor(actor),
            WalRecord::BatchCreated { batch, genesis } => self.check_genesis(batch, genesis),
            WalRecord::EntryAppended { entry } => self.check_transition(entry),
        }
    }

    /// Apply a checked record.
    pub fn apply_record(&mut self, record: WalRecord) {
        match record {
            WalRecord::ActorRegistered(actor) => self.apply_insert_actor(actor),
            WalRecord::ActorUpdated(actor) => self.apply_update_actor(actor),
            WalRecord::BatchCreated { batch, genesis } => self.apply_genesis(batch, genesis),
            WalRecord::EntryAppended { entry } => {
                self.apply_transition(entry);
            }
        }
    }

    /// Mutable access to a stored entry, bypassing every check.
    #[cfg(feature = "fault-injection")]
    pub fn entry_mut(&mut self, batch: &BatchId, sequence: u64) -> Option<&mut LedgerEntry> {
        self.entries
            .get_mut(batch)
            .and_then(|chain| chain.get_mut(sequence as usize))
    }

    /// Mutable access to a stored batch, bypassing every check.
    #[cfg(feature = "fault-injection")]
    pub fn batch_mut(&mut self, id: &BatchId) -> Option<&mut Batch> {
        self.batches.get_mut(id)
    }
}
