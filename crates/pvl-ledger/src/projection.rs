use std::collections::BTreeMap;

use pvl_store::ActorStore;
use pvl_types::{ActorId, BatchStatus, LedgerEntry, Role};
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::history::LedgerReader;

/// Ledger-wide aggregation, recomputed on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_actors: u64,
    pub actors_by_role: BTreeMap<Role, u64>,
    pub total_batches: u64,
    pub total_entries: u64,
    pub batches_by_status: BTreeMap<BatchStatus, u64>,
    /// Sum of `quantity * unit_price` over all batches, in minor units.
    pub total_value: u64,
}

/// What one actor has done on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorActivity {
    pub actor_id: ActorId,
    pub entries: Vec<LedgerEntry>,
    pub batches_owned: u64,
}

/// Deterministic projection builders.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Counts and totals across the whole store.
    ///
    /// Every status and role appears in the maps, with zero counts included,
    /// so consumers can render a fixed table.
    pub fn stats<S>(store: &S) -> LedgerResult<LedgerStats>
    where
        S: ActorStore + LedgerReader + ?Sized,
    {
        let mut stats = LedgerStats {
            actors_by_role: Role::ALL.into_iter().map(|r| (r, 0)).collect(),
            batches_by_status: BatchStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            ..LedgerStats::default()
        };

        for actor in store.actors()? {
            stats.total_actors += 1;
            *stats.actors_by_role.entry(actor.role).or_default() += 1;
        }

        let mut total_value: u128 = 0;
        for batch in store.batches()? {
            stats.total_batches += 1;
            *stats.batches_by_status.entry(batch.status).or_default() += 1;
            total_value += batch.details.total_value();
        }
        stats.total_value = u64::try_from(total_value).unwrap_or(u64::MAX);
        stats.total_entries = store.entry_count()? as u64;

        Ok(stats)
    }

    /// Entries appended by `actor` and the number of batches it owns.
    pub fn actor_activity<R: LedgerReader + ?Sized>(
        reader: &R,
        actor: &ActorId,
    ) -> LedgerResult<ActorActivity> {
        Ok(ActorActivity {
            actor_id: *actor,
            entries: reader.entries_by_actor(actor)?,
            batches_owned: reader.batches_by_owner(actor)?.len() as u64,
        })
    }
}
