//! Foundation types for the Provenance Ledger (PVL).
//!
//! This crate provides the identity, lifecycle, and record types shared by
//! every other PVL crate. It carries no storage or hashing policy of its own
//! beyond the canonical encoding that ledger hashes are computed over.
//!
//! # Key Types
//!
//! - [`ActorId`] / [`BatchId`]: UUID v7 identifiers, never derived from wall-clock strings
//! - [`Role`]: closed set of supply-chain roles
//! - [`BatchStatus`] / [`LedgerAction`]: the linear lifecycle and the actions that drive it
//! - [`EntryHash`]: 32-byte chain digest with a fixed genesis constant
//! - [`Timestamp`]: millisecond clock reading with a logical tie-breaker
//! - [`LookupKey`]: public, shareable batch key
//! - [`Actor`], [`Batch`], [`LedgerEntry`]: the persisted records

pub mod actor;
pub mod batch;
pub mod digest;
pub mod entry;
pub mod error;
pub mod ids;
pub mod lookup;
pub mod role;
pub mod status;
pub mod temporal;

pub use actor::{Actor, ActorRegistration};
pub use batch::{Batch, BatchDetails};
pub use digest::EntryHash;
pub use entry::LedgerEntry;
pub use error::TypeError;
pub use ids::{ActorId, BatchId};
pub use lookup::LookupKey;
pub use role::Role;
pub use status::{BatchStatus, LedgerAction};
pub use temporal::Timestamp;
