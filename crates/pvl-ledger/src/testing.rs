use chrono::NaiveDate;
use pvl_store::{InMemoryTraceStore, TraceStore};
use pvl_types::{
    ActorId, Batch, BatchDetails, BatchId, BatchStatus, LedgerAction, LedgerEntry, LookupKey, Role,
    Timestamp,
};

use crate::sealing::{seal, ChainPosition, EntryDraft};

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

/// Create a batch with a properly sealed genesis entry.
pub fn create_batch(store: &InMemoryTraceStore, name: &str) -> (Batch, LedgerEntry) {
    create_batch_for(store, ActorId::new(), name)
}

pub fn create_batch_for(
    store: &InMemoryTraceStore,
    owner: ActorId,
    name: &str,
) -> (Batch, LedgerEntry) {
    let id = BatchId::new();
    let genesis = seal(
        EntryDraft {
            batch_id: id,
            actor_id: owner,
            actor_role: Role::Producer,
            action: LedgerAction::Harvest,
            location: "California, USA".into(),
            notes: Some("initial harvest".into()),
        },
        ChainPosition::genesis(),
        Timestamp::new(1_000, 0),
    );
    let batch = Batch {
        id,
        owner,
        details: details(name),
        lookup_key: LookupKey::derive(&id, name, 0),
        status: BatchStatus::Harvested,
        created_at: genesis.timestamp,
    };
    store.commit_genesis(&batch, &genesis).unwrap();
    (batch, genesis)
}

/// Seal and commit the next entry after `prev`.
pub fn transition(
    store: &InMemoryTraceStore,
    prev: &LedgerEntry,
    action: LedgerAction,
) -> LedgerEntry {
    let entry = seal(
        EntryDraft {
            batch_id: prev.batch_id,
            actor_id: prev.actor_id,
            actor_role: Role::Distributor,
            action,
            location: "Texas, USA".into(),
            notes: None,
        },
        ChainPosition::after(prev),
        Timestamp::new(prev.timestamp.unix_ms + 1_000, 0),
    );
    store.commit_transition(&entry).unwrap();
    entry
}
