use std::sync::Arc;

use pvl_gate::{TransitionGate, TransitionRequest};
use pvl_ledger::{position, seal, ChainPosition, EntryDraft};
use pvl_store::{ActorStore, BatchStore, StoreError, TraceStore};
use pvl_types::{
    Actor, ActorId, Batch, BatchDetails, BatchId, BatchStatus, LedgerAction, LedgerEntry,
    LookupKey, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::BatchLocks;

/// Location recorded when neither the request nor the actor supplies one.
pub const UNSPECIFIED_LOCATION: &str = "unspecified";

/// Note attached to a genesis entry when the creator gives none.
pub const GENESIS_NOTE: &str = "initial harvest";

/// A request to move a batch to its next status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCommand {
    pub batch_id: BatchId,
    pub requested_status: BatchStatus,
    pub actor_id: ActorId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl TransitionCommand {
    pub fn new(batch_id: BatchId, requested_status: BatchStatus, actor_id: ActorId) -> Self {
        Self {
            batch_id,
            requested_status,
            actor_id,
            notes: None,
            location: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The only write path for batches and their ledgers.
pub struct TransitionService {
    store: Arc<dyn TraceStore>,
    gate: TransitionGate,
    locks: BatchLocks,
    lookup_key_attempts: u32,
}

impl TransitionService {
    pub fn new(store: Arc<dyn TraceStore>, config: &ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            gate: TransitionGate::with_default_stages(config.gate.clone())?,
            locks: BatchLocks::new(config.lock_timeout()),
            lookup_key_attempts: config.lookup_key_attempts,
        })
    }

    pub fn gate(&self) -> &TransitionGate {
        &self.gate
    }

    /// Register a new batch owned by `owner`, together with its genesis entry.
    pub fn create_batch(
        &self,
        owner: &ActorId,
        details: BatchDetails,
        notes: Option<String>,
    ) -> ServiceResult<Batch> {
        let owner = self.actor(owner)?;
        if let Err(denial) = self.gate.check_creation(owner.role) {
            warn!(actor = %owner.id, role = %owner.role, %denial, "batch creation denied");
            return Err(ServiceError::IllegalTransition(denial));
        }
        let details = details.normalised()?;

        let id = BatchId::new();
        let genesis = seal(
            EntryDraft {
                batch_id: id,
                actor_id: owner.id,
                actor_role: owner.role,
                action: LedgerAction::Harvest,
                location: details.origin_location.clone(),
                notes: Some(clean(notes).unwrap_or_else(|| GENESIS_NOTE.to_string())),
            },
            ChainPosition::genesis(),
            Timestamp::now(),
        );

        for attempt in 0..self.lookup_key_attempts {
            let batch = Batch {
                id,
                owner: owner.id,
                lookup_key: LookupKey::derive(&id, &details.name, attempt),
                details: details.clone(),
                status: BatchStatus::Harvested,
                created_at: genesis.timestamp,
            };
            match self.store.commit_genesis(&batch, &genesis) {
                Ok(()) => {
                    info!(
                        batch = %batch.id,
                        key = %batch.lookup_key,
                        owner = %owner.id,
                        name = %batch.details.name,
                        "batch created"
                    );
                    return Ok(batch);
                }
                Err(StoreError::KeyCollision(key)) => {
                    debug!(batch = %id, %key, attempt, "lookup key taken, deriving another");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::KeyCollision(format!(
            "no free lookup key for batch {id} after {} attempts",
            self.lookup_key_attempts
        )))
    }

    /// Advance a batch to `command.requested_status`.
    ///
    /// Nothing is written unless every check passes; the new entry and the
    /// batch's status change are committed together.
    pub fn transition(&self, command: TransitionCommand) -> ServiceResult<LedgerEntry> {
        let actor = self.actor(&command.actor_id)?;
        let batch_id = command.batch_id;
        if self.store.batch(&batch_id)?.is_none() {
            return Err(ServiceError::batch_not_found(batch_id));
        }

        self.locks.with_lock(&batch_id, || {
            let batch = self
                .store
                .batch(&batch_id)?
                .ok_or_else(|| ServiceError::batch_not_found(batch_id))?;

            let request = TransitionRequest::new(batch.status, command.requested_status, actor.role);
            if let Err(denial) = self.gate.evaluate(&request)?.into_result() {
                warn!(
                    batch = %batch_id,
                    actor = %actor.id,
                    role = %actor.role,
                    %denial,
                    "transition denied"
                );
                return Err(ServiceError::IllegalTransition(denial));
            }

            let tail = position(self.store.as_ref(), &batch_id)?;
            let entry = seal(
                EntryDraft {
                    batch_id,
                    actor_id: actor.id,
                    actor_role: actor.role,
                    action: command.requested_status.entering_action(),
                    location: clean(command.location)
                        .or_else(|| actor.location.clone())
                        .unwrap_or_else(|| UNSPECIFIED_LOCATION.to_string()),
                    notes: clean(command.notes),
                },
                tail,
                Timestamp::now(),
            );

            let updated = self.store.commit_transition(&entry)?;
            info!(
                batch = %batch_id,
                actor = %actor.id,
                from = %batch.status,
                to = %updated.status,
                sequence = entry.sequence_no,
                hash = %entry.entry_hash.short_hex(),
                "transition committed"
            );
            Ok(entry)
        })
    }

    fn actor(&self, id: &ActorId) -> ServiceResult<Actor> {
        self.store
            .actor(id)?
            .ok_or_else(|| ServiceError::actor_not_found(id))
    }
}

impl std::fmt::Debug for TransitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionService")
            .field("gate", &self.gate)
            .field("locks", &self.locks)
            .field("lookup_key_attempts", &self.lookup_key_attempts)
            .finish()
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
