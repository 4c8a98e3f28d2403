//! Storage backends for the Provenance Ledger.
//!
//! The store holds three tables: registered actors, current-state batch
//! records, and the per-batch append-only ledger entries. Reads go through
//! the [`ActorStore`], [`BatchStore`], and [`EntryStore`] traits; every write
//! that touches a batch goes through the atomic [`TraceStore`] boundary, so
//! a batch's status can never drift from the tail of its chain.
//!
//! # Backends
//!
//! - [`InMemoryTraceStore`]: `RwLock`-guarded tables for tests and embedding
//! - [`DurableTraceStore`]: the same tables rebuilt from a CRC-framed
//!   write-ahead log on open
//!
//! # Rules
//!
//! 1. Nothing is ever physically removed; entries are never rewritten.
//! 2. A commit is validated, persisted, then applied. A rejected commit
//!    changes nothing.
//! 3. Appends re-check sequence number and predecessor hash under the write
//!    lock, so two writers that read the same tail cannot both succeed.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod durable;
pub mod error;
pub mod memory;
mod tables;
pub mod traits;
pub mod wal;

#[cfg(test)]
mod testing;

pub use durable::{DurableTraceStore, WAL_FILE_NAME};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTraceStore;
pub use traits::{ActorStore, BatchStore, EntryStore, TraceStore};
pub use wal::{SyncMode, WalRecord, WriteAheadLog};
