use pvl_store::{BatchStore, EntryStore};
use pvl_types::{BatchId, LedgerEntry};

use crate::error::{LedgerError, LedgerResult};
use crate::sealing::ChainPosition;

/// Read boundary for ledger queries.
///
/// Implemented for every store that exposes both batches and entries, so the
/// ledger never needs to know which backend it reads from.
pub trait LedgerReader: BatchStore + EntryStore {}

impl<T: BatchStore + EntryStore + ?Sized> LedgerReader for T {}

/// Full history of a batch, ascending by sequence number.
///
/// Fails with `BatchNotFound` for batches that were never created, so an
/// empty result never masks a typo in the id.
pub fn history<R: LedgerReader + ?Sized>(
    reader: &R,
    batch: &BatchId,
) -> LedgerResult<Vec<LedgerEntry>> {
    ensure_batch(reader, batch)?;
    Ok(reader.entries(batch)?)
}

/// Where the next entry of `batch` attaches.
pub fn position<R: LedgerReader + ?Sized>(
    reader: &R,
    batch: &BatchId,
) -> LedgerResult<ChainPosition> {
    ensure_batch(reader, batch)?;
    Ok(ChainPosition::from_tail(reader.tail(batch)?.as_ref()))
}

fn ensure_batch<R: LedgerReader + ?Sized>(reader: &R, batch: &BatchId) -> LedgerResult<()> {
    match reader.batch(batch)? {
        Some(_) => Ok(()),
        None => Err(LedgerError::BatchNotFound(*batch)),
    }
}
