use chrono::NaiveDate;
use pvl_types::{
    Actor, ActorRegistration, Batch, BatchDetails, BatchId, EntryHash, LedgerAction, LedgerEntry,
    LookupKey, Role, Timestamp,
};

pub fn producer(identity: &str) -> Actor {
    ActorRegistration::new("John Farmer", Role::Producer)
        .with_identity(identity)
        .into_actor(Timestamp::new(1_000, 0))
        .unwrap()
}

pub fn batch_with_genesis(owner: &Actor, name: &str) -> (Batch, LedgerEntry) {
    let id = BatchId::new();
    let batch = Batch {
        id,
        owner: owner.id,
        details: BatchDetails {
            name: name.into(),
            category: "Vegetable".into(),
            origin_location: "California, USA".into(),
            produced_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            quantity: 100,
            unit: "kg".into(),
            unit_price: 599,
        },
        lookup_key: LookupKey::derive(&id, name, 0),
        status: pvl_types::BatchStatus::Harvested,
        created_at: Timestamp::new(2_000, 0),
    };
    let genesis = LedgerEntry {
        sequence_no: 0,
        batch_id: id,
        actor_id: owner.id,
        actor_role_at_time: owner.role,
        action: LedgerAction::Harvest,
        prev_entry_hash: EntryHash::GENESIS,
        entry_hash: EntryHash::from_bytes([1; 32]),
        timestamp: Timestamp::new(2_000, 0),
        location: "California, USA".into(),
        notes: Some("initial harvest".into()),
    };
    (batch, genesis)
}

/// An entry extending `prev`, with a placeholder hash unique per sequence number.
pub fn next_entry(prev: &LedgerEntry, action: LedgerAction) -> LedgerEntry {
    let sequence_no = prev.sequence_no + 1;
    LedgerEntry {
        sequence_no,
        prev_entry_hash: prev.entry_hash,
        entry_hash: EntryHash::from_bytes([sequence_no as u8 + 1; 32]),
        action,
        timestamp: Timestamp::new(prev.timestamp.unix_ms + 1, 0),
        notes: None,
        ..prev.clone()
    }
}
