use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use pvl_store::{
    ActorStore, BatchStore, EntryStore, InMemoryTraceStore, StoreError, StoreResult, TraceStore,
};
use pvl_types::{
    Actor, ActorId, ActorRegistration, Batch, BatchDetails, BatchId, LedgerEntry, LookupKey, Role,
    Timestamp,
};

pub fn details(name: &str) -> BatchDetails {
    BatchDetails {
        name: name.into(),
        category: "Vegetable".into(),
        origin_location: "California, USA".into(),
        produced_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        quantity: 100,
        unit: "kg".into(),
        unit_price: 250,
    }
}

/// Register an actor straight into the store.
pub fn register(store: &dyn TraceStore, name: &str, role: Role) -> Actor {
    let actor = ActorRegistration::new(name, role)
        .into_actor(Timestamp::now())
        .unwrap();
    store.insert_actor(&actor).unwrap();
    actor
}

/// A store whose first `collisions` genesis commits report a taken lookup key.
pub struct CollidingStore {
    inner: InMemoryTraceStore,
    collisions: AtomicU32,
}

impl CollidingStore {
    pub fn new(collisions: u32) -> Self {
        Self {
            inner: InMemoryTraceStore::new(),
            collisions: AtomicU32::new(collisions),
        }
    }
}

impl ActorStore for CollidingStore {
    fn insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        self.inner.insert_actor(actor)
    }
    fn update_actor(&self, actor: &Actor) -> StoreResult<()> {
        self.inner.update_actor(actor)
    }
    fn actor(&self, id: &ActorId) -> StoreResult<Option<Actor>> {
        self.inner.actor(id)
    }
    fn actor_by_identity(&self, identity: &str) -> StoreResult<Option<Actor>> {
        self.inner.actor_by_identity(identity)
    }
    fn actors(&self) -> StoreResult<Vec<Actor>> {
        self.inner.actors()
    }
}

impl BatchStore for CollidingStore {
    fn batch(&self, id: &BatchId) -> StoreResult<Option<Batch>> {
        self.inner.batch(id)
    }
    fn batch_by_lookup_key(&self, key: &LookupKey) -> StoreResult<Option<Batch>> {
        self.inner.batch_by_lookup_key(key)
    }
    fn batches_by_owner(&self, owner: &ActorId) -> StoreResult<Vec<Batch>> {
        self.inner.batches_by_owner(owner)
    }
    fn batches(&self) -> StoreResult<Vec<Batch>> {
        self.inner.batches()
    }
}

impl EntryStore for CollidingStore {
    fn entries(&self, batch: &BatchId) -> StoreResult<Vec<LedgerEntry>> {
        self.inner.entries(batch)
    }
    fn tail(&self, batch: &BatchId) -> StoreResult<Option<LedgerEntry>> {
        self.inner.tail(batch)
    }
    fn entries_by_actor(&self, actor: &ActorId) -> StoreResult<Vec<LedgerEntry>> {
        self.inner.entries_by_actor(actor)
    }
    fn entry_count(&self) -> StoreResult<usize> {
        self.inner.entry_count()
    }
}

impl TraceStore for CollidingStore {
    fn commit_genesis(&self, batch: &Batch, genesis: &LedgerEntry) -> StoreResult<()> {
        let remaining = self.collisions.load(Ordering::SeqCst);
        if remaining > 0 {
            self.collisions.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::KeyCollision(batch.lookup_key.clone()));
        }
        self.inner.commit_genesis(batch, genesis)
    }
    fn commit_transition(&self, entry: &LedgerEntry) -> StoreResult<Batch> {
        self.inner.commit_transition(entry)
    }
}
