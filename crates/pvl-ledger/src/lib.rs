//! Hash-chained ledger logic for the Provenance Ledger (PVL).
//!
//! This crate is the integrity core of PVL. It provides:
//! - Entry sealing: attach a draft to the tail of a batch's chain and hash it
//! - History and tail-position reads over any [`pvl_store`] backend
//! - Chain verification with the first failing sequence number
//! - A store-wide audit that also catches batch views drifting from their ledger
//! - Deterministic replay and read-only aggregation projections

pub mod error;
pub mod history;
pub mod projection;
pub mod replay;
pub mod sealing;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{LedgerError, LedgerResult};
pub use history::{history, position, LedgerReader};
pub use projection::{ActorActivity, LedgerStats, ProjectionBuilder};
pub use replay::{ReplayEngine, ReplayResult};
pub use sealing::{seal, ChainPosition, EntryDraft};
pub use validation::{
    AuditReport, ChainReport, StreamValidator, ViewDivergence, Violation, ViolationKind,
};
