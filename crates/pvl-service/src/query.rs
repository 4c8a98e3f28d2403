use std::sync::Arc;

use pvl_ledger::{
    history, ActorActivity, AuditReport, ChainReport, LedgerStats, ProjectionBuilder, ReplayEngine,
    ReplayResult, StreamValidator,
};
use pvl_store::{ActorStore, BatchStore, TraceStore};
use pvl_types::{ActorId, Batch, BatchId, LedgerEntry, LookupKey};
use tracing::error;

use crate::error::{ServiceError, ServiceResult};

/// Read-only access to batches, their ledgers, and integrity checks.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn TraceStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    /// Look a batch up by lookup key or by id.
    ///
    /// The lookup key is tried first, since a batch name can slug into a
    /// UUID-shaped key. Input that is neither a known key nor a valid id is
    /// not found.
    pub fn get_batch(&self, key_or_id: &str) -> ServiceResult<Batch> {
        let needle = key_or_id.trim();
        if let Ok(key) = LookupKey::parse(needle) {
            if let Some(batch) = self.store.batch_by_lookup_key(&key)? {
                return Ok(batch);
            }
        }
        match needle.parse::<BatchId>() {
            Ok(id) => self.batch(&id),
            Err(_) => Err(ServiceError::batch_not_found(needle)),
        }
    }

    pub fn batch(&self, id: &BatchId) -> ServiceResult<Batch> {
        self.store
            .batch(id)?
            .ok_or_else(|| ServiceError::batch_not_found(id))
    }

    pub fn batch_by_lookup_key(&self, key: &LookupKey) -> ServiceResult<Batch> {
        self.store
            .batch_by_lookup_key(key)?
            .ok_or_else(|| ServiceError::batch_not_found(key))
    }

    /// Entries of a batch, ascending by sequence number.
    pub fn get_history(&self, batch: &BatchId) -> ServiceResult<Vec<LedgerEntry>> {
        Ok(history(self.store.as_ref(), batch)?)
    }

    pub fn verify_chain(&self, batch: &BatchId) -> ServiceResult<ChainReport> {
        Ok(StreamValidator::verify_chain(self.store.as_ref(), batch)?)
    }

    /// Verify a chain and fail with `ChainIntegrityViolation` if it is broken.
    pub fn ensure_intact(&self, batch: &BatchId) -> ServiceResult<ChainReport> {
        let report = self.verify_chain(batch)?;
        report.into_result().map_err(|err| {
            error!(batch = %batch, error = %err, "ledger integrity violation");
            err.into()
        })
    }

    pub fn list_by_owner(&self, owner: &ActorId) -> ServiceResult<Vec<Batch>> {
        self.ensure_actor(owner)?;
        Ok(self.store.batches_by_owner(owner)?)
    }

    /// Every batch in creation order.
    pub fn list_all(&self) -> ServiceResult<Vec<Batch>> {
        Ok(self.store.batches()?)
    }

    /// Entries appended by `actor` across all batches.
    pub fn entries_by_actor(&self, actor: &ActorId) -> ServiceResult<Vec<LedgerEntry>> {
        self.ensure_actor(actor)?;
        Ok(self.store.entries_by_actor(actor)?)
    }

    /// Verify every chain and check every batch view against its ledger.
    pub fn audit_all(&self) -> ServiceResult<AuditReport> {
        let report = StreamValidator::audit_all(self.store.as_ref())?;
        for chain in report.broken_chains() {
            error!(
                batch = %chain.batch_id,
                sequence = ?chain.broken_at_sequence,
                "ledger integrity violation"
            );
        }
        for divergence in &report.divergences {
            error!(
                batch = %divergence.batch_id,
                stored = %divergence.stored_status,
                ledger = ?divergence.ledger_status,
                "batch view diverges from ledger"
            );
        }
        Ok(report)
    }

    /// Recompute a batch's state from its ledger alone.
    pub fn replay(&self, batch: &BatchId) -> ServiceResult<ReplayResult> {
        Ok(ReplayEngine::replay_batch(self.store.as_ref(), batch)?)
    }

    pub fn stats(&self) -> ServiceResult<LedgerStats> {
        Ok(ProjectionBuilder::stats(self.store.as_ref())?)
    }

    pub fn actor_activity(&self, actor: &ActorId) -> ServiceResult<ActorActivity> {
        self.ensure_actor(actor)?;
        Ok(ProjectionBuilder::actor_activity(self.store.as_ref(), actor)?)
    }

    fn ensure_actor(&self, id: &ActorId) -> ServiceResult<()> {
        match self.store.actor(id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::actor_not_found(id)),
        }
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService").finish_non_exhaustive()
    }
}
